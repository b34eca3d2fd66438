use super::{DocumentStore, StoredDocument, is_safe_component};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each job's documents in `<root>/<job_id>/`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Use `root` as the base directory. It is created on first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a job's documents.
    pub fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        if !is_safe_component(job_id) {
            return Err(anyhow!("Invalid job id: {job_id:?}"));
        }
        Ok(self.root.join(job_id))
    }

    fn document_path(&self, job_id: &str, name: &str) -> Result<PathBuf> {
        if !is_safe_component(name) {
            return Err(anyhow!("Invalid document name: {name:?}"));
        }
        Ok(self.job_dir(job_id)?.join(name))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn save_document(
        &self,
        job_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        let path = self.document_path(job_id, name)?;
        tokio::fs::create_dir_all(self.job_dir(job_id)?).await?;
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(StoredDocument::describe(name, bytes))
    }

    async fn load_document(&self, job_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.document_path(job_id, name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_documents(&self, job_id: &str) -> Result<Vec<StoredDocument>> {
        let dir = self.job_dir(job_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let bytes = tokio::fs::read(entry.path()).await?;
            let mut document = StoredDocument::describe(&name, &bytes);
            if let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) {
                document.stored_at = modified.into();
            }
            documents.push(document);
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        let dir = self.job_dir(job_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Removed {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
