//! Storage of the raw uploaded documents of each job.
//!
//! Only the original bytes are persisted, so they can be served again later.
//! The section/vector index lives in memory and is never written here.
//!
//! ## Key Components
//!
//! - **DocumentStore**: async trait for saving, loading, listing and deleting
//!   a job's documents
//! - **FsDocumentStore**: one directory per job under a root directory
//! - **MemoryDocumentStore**: map-backed store for tests and ephemeral use
//!
//! ## Layout
//!
//! ```text
//! <root>/<job_id>/<stored name>
//! ```

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod fs_store;
pub mod memory_store;

pub use fs_store::FsDocumentStore;
pub use memory_store::MemoryDocumentStore;

/// Metadata of a document persisted for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    /// Sanitized name, unique within the job
    pub name: String,
    pub size: usize,
    /// Hex-encoded blake3 hash of the bytes
    pub content_hash: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn describe(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len(),
            content_hash: hex::encode(blake3::hash(bytes).as_bytes()),
            stored_at: Utc::now(),
        }
    }
}

/// Persistence of uploaded document bytes, grouped by job.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `bytes` under `name` for `job_id`, replacing any previous copy
    async fn save_document(&self, job_id: &str, name: &str, bytes: &[u8])
    -> Result<StoredDocument>;

    /// Load a stored document, `None` if the job or name is unknown
    async fn load_document(&self, job_id: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// List the documents stored for a job, sorted by name
    async fn list_documents(&self, job_id: &str) -> Result<Vec<StoredDocument>>;

    /// Remove everything stored for a job. Unknown jobs are a no-op.
    async fn delete_job(&self, job_id: &str) -> Result<()>;
}

/// Reduce an uploaded filename to characters safe for paths and section ids.
///
/// ASCII letters, digits, `.`, `-` and `_` are kept; everything else becomes
/// `_`. Leading dots are stripped so the result is never hidden or relative.
/// An empty result becomes `document`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

/// True when `component` can be used as a single path segment: non-empty,
/// no separators, not `.` or `..`, and only characters [`sanitize_filename`]
/// would keep.
pub fn is_safe_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
