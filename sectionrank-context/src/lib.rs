pub mod chunker;
pub mod section;

// Re-export the chunking entry points for external use
pub use chunker::{ChunkingConfig, SectionChunker, split_pages};
pub use section::{Section, parse_section_id, section_id};
