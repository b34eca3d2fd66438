//! Configuration for chunking, retrieval and extraction failure handling.
//!
//! Every option has a default, so an empty TOML file (or none at all) is a
//! valid configuration:
//!
//! ```toml
//! topK = 5
//! similarityThreshold = 0.25
//! snippetChars = 220
//! extractionFailure = "abort"
//!
//! [chunking]
//! targetWords = 300
//! overlapWords = 120
//! minChunkChars = 160
//! ```

use crate::error::{Result, RetrieverError};
use sectionrank_context::ChunkingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `analyze` does when the extractor fails for one of several documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionFailurePolicy {
    /// Log the failure, leave the document out, index the rest
    #[default]
    Skip,
    /// Fail the whole job and discard its stored documents
    Abort,
}

/// Configuration for the job index store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrieverConfig {
    /// Results returned when a query asks for zero or no explicit count
    pub top_k: usize,
    /// Minimum cosine score a related section must reach
    pub similarity_threshold: f32,
    /// Maximum snippet length in characters
    pub snippet_chars: usize,
    pub extraction_failure: ExtractionFailurePolicy,
    /// Windowing parameters
    pub chunking: ChunkingConfig,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: 0.30,
            snippet_chars: 220,
            extraction_failure: ExtractionFailurePolicy::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl RetrieverConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Check that every option is in range.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.target_words == 0 {
            return Err(RetrieverError::invalid_config(
                "chunking.targetWords must be at least 1",
            ));
        }
        if self.top_k == 0 {
            return Err(RetrieverError::invalid_config("topK must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RetrieverError::invalid_config(format!(
                "similarityThreshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.snippet_chars == 0 {
            return Err(RetrieverError::invalid_config(
                "snippetChars must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn with_extraction_failure(mut self, policy: ExtractionFailurePolicy) -> Self {
        self.extraction_failure = policy;
        self
    }
}
