use super::{DocumentStore, StoredDocument};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type JobDocuments = BTreeMap<String, (StoredDocument, Vec<u8>)>;

/// Keeps documents in memory. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    jobs: RwLock<HashMap<String, JobDocuments>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs with at least one stored document.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save_document(
        &self,
        job_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        let document = StoredDocument::describe(name, bytes);
        self.jobs
            .write()
            .await
            .entry(job_id.to_string())
            .or_default()
            .insert(name.to_string(), (document.clone(), bytes.to_vec()));
        Ok(document)
    }

    async fn load_document(&self, job_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .get(job_id)
            .and_then(|documents| documents.get(name))
            .map(|(_, bytes)| bytes.clone()))
    }

    async fn list_documents(&self, job_id: &str) -> Result<Vec<StoredDocument>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .get(job_id)
            .map(|documents| documents.values().map(|(doc, _)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        self.jobs.write().await.remove(job_id);
        Ok(())
    }
}
