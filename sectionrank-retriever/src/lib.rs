//! sectionrank-retriever: lexical "related sections" retrieval per job
//!
//! A job is a set of uploaded documents analyzed together. Each document is
//! split into overlapping word-window sections, every section gets a TF-IDF
//! vector over the job's vocabulary, and queries return the sections most
//! similar to a given one by cosine similarity. Everything is held in memory
//! and discarded when the job is deleted.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: vector space, ranking engine and the job index store
//! - **[`extraction`]**: seam for turning uploaded bytes into page text
//! - **[`storage`]**: persistence of the raw uploads per job
//! - **[`config`]**: TOML-backed tunables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sectionrank_retriever::{JobIndexStore, RetrieverConfig, UploadedDocument};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = JobIndexStore::in_memory(RetrieverConfig::default())?;
//! let job_id = store
//!     .analyze(vec![UploadedDocument::from_path("report.txt").await?])
//!     .await?;
//!
//! let sections = store.sections(&job_id).await;
//! let related = store.related(&job_id, &sections[0].id, Some(5)).await;
//! store.delete_job(&job_id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Uploads → DocumentStore
//!    ↓
//! TextExtractor → SectionChunker → VectorSpace → JobIndex
//!                                                   ↓
//!           related / sections ← JobIndexRegistry ←─┘
//! ```

pub mod config;
pub mod error;
pub mod extraction;
pub mod retrieval;
pub mod storage;

pub use config::{ExtractionFailurePolicy, RetrieverConfig};
pub use error::{Result, RetrieverError};
pub use extraction::{PlainTextExtractor, TextExtractor, UploadedDocument};
pub use retrieval::engine::{RelatedResult, RetrievalEngine};
pub use retrieval::job_store::{JobIndexStore, StoreStatistics};
pub use sectionrank_context::{ChunkingConfig, Section};
