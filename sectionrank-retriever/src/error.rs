//! Error types for the retriever

/// Result type for retriever operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the job index store and its collaborators.
///
/// Queries against unknown jobs are deliberately absent here: `related` and
/// `sections` answer those with empty results.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// The caller passed input that can never succeed, e.g. no documents
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Sections and vectors of a job do not line up
    #[error("Index consistency violation for job {job_id}: {message}")]
    ConsistencyViolation { job_id: String, message: String },

    /// The text extractor failed for one document
    #[error("Text extraction failed for {document}: {source}")]
    ExtractionFailed {
        document: String,
        #[source]
        source: BoxError,
    },

    /// Configuration values out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {source}")]
    ConfigParse {
        #[from]
        source: toml::de::Error,
    },

    /// The document store failed
    #[error("Document storage failed: {source}")]
    Storage {
        #[source]
        source: BoxError,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A blocking build task panicked or was cancelled
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl RetrieverError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn consistency<J: Into<String>, S: Into<String>>(job_id: J, message: S) -> Self {
        Self::ConsistencyViolation {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    /// Wrap an extractor failure for the named document.
    pub fn extraction<D: Into<String>>(document: D, source: anyhow::Error) -> Self {
        Self::ExtractionFailed {
            document: document.into(),
            source: source.into(),
        }
    }

    /// Wrap a document store failure.
    pub fn storage(source: anyhow::Error) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }
}
