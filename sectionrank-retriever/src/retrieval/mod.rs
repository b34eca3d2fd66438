pub mod engine;
pub mod job_index;
pub mod job_store;
pub mod tokenizer;
pub mod top_k;
pub mod vector_space;
