//! The immutable per-job index and the registry that publishes it.

use super::vector_space::SparseVector;
use crate::error::{Result, RetrieverError};
use crate::storage::StoredDocument;
use chrono::{DateTime, Utc};
use sectionrank_context::Section;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sections and vectors of one job. Never mutated after construction.
#[derive(Debug)]
pub struct JobIndex {
    job_id: String,
    sections: Vec<Section>,
    vectors: HashMap<String, SparseVector>,
    vocabulary_size: usize,
    documents: Vec<StoredDocument>,
    created_at: DateTime<Utc>,
}

impl JobIndex {
    /// Assemble a job index, rejecting sections and vectors that do not
    /// correspond 1:1 by id.
    pub fn new(
        job_id: impl Into<String>,
        sections: Vec<Section>,
        vectors: HashMap<String, SparseVector>,
        vocabulary_size: usize,
        documents: Vec<StoredDocument>,
    ) -> Result<Self> {
        let index = Self {
            job_id: job_id.into(),
            sections,
            vectors,
            vocabulary_size,
            documents,
            created_at: Utc::now(),
        };
        index.verify()?;
        Ok(index)
    }

    /// Check the section/vector correspondence and vector dimensions.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.sections.len());
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(RetrieverError::consistency(
                    &self.job_id,
                    format!("duplicate section id {}", section.id),
                ));
            }
            match self.vectors.get(&section.id) {
                None => {
                    return Err(RetrieverError::consistency(
                        &self.job_id,
                        format!("section {} has no vector", section.id),
                    ));
                }
                Some(vector) if vector.dimension() != self.vocabulary_size => {
                    return Err(RetrieverError::consistency(
                        &self.job_id,
                        format!(
                            "vector of {} has dimension {}, vocabulary has {}",
                            section.id,
                            vector.dimension(),
                            self.vocabulary_size
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
        if self.vectors.len() != self.sections.len() {
            return Err(RetrieverError::consistency(
                &self.job_id,
                format!(
                    "{} sections but {} vectors",
                    self.sections.len(),
                    self.vectors.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn vectors(&self) -> &HashMap<String, SparseVector> {
        &self.vectors
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Published job indexes, keyed by job id.
///
/// Readers clone the `Arc` and drop the lock before doing any work, so a
/// long query never blocks publication or deletion of other jobs.
#[derive(Debug, Default)]
pub struct JobIndexRegistry {
    jobs: RwLock<HashMap<String, Arc<JobIndex>>>,
}

impl JobIndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a fully built index visible. A job id can be published once.
    pub async fn publish(&self, index: JobIndex) -> Result<Arc<JobIndex>> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(index.job_id()) {
            return Err(RetrieverError::consistency(
                index.job_id(),
                "job id is already published",
            ));
        }
        let index = Arc::new(index);
        jobs.insert(index.job_id().to_string(), Arc::clone(&index));
        Ok(index)
    }

    pub async fn get(&self, job_id: &str) -> Option<Arc<JobIndex>> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Remove a job, returning its index if it was present.
    pub async fn remove(&self, job_id: &str) -> Option<Arc<JobIndex>> {
        self.jobs.write().await.remove(job_id)
    }

    pub async fn contains(&self, job_id: &str) -> bool {
        self.jobs.read().await.contains_key(job_id)
    }

    pub async fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn snapshot(&self) -> Vec<Arc<JobIndex>> {
        self.jobs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::vector_space::VectorSpace;

    fn sections() -> Vec<Section> {
        vec![
            Section::new("doc", 1, 1, "pump pressure readings".to_string()),
            Section::new("doc", 1, 2, "pump maintenance schedule".to_string()),
        ]
    }

    fn index(job_id: &str) -> JobIndex {
        let sections = sections();
        let space = VectorSpace::build(&sections);
        let dimension = space.dimension();
        JobIndex::new(job_id, sections, space.into_vectors(), dimension, Vec::new()).unwrap()
    }

    #[test]
    fn test_new_accepts_consistent_index() {
        let index = index("job");
        assert_eq!(index.sections().len(), index.vectors().len());
        assert!(index.section("doc:1:2").is_some());
        assert!(index.section("doc:9:9").is_none());
    }

    #[test]
    fn test_new_rejects_missing_vector() {
        let sections = sections();
        let space = VectorSpace::build(&sections[..1]);
        let dimension = space.dimension();

        let result = JobIndex::new("job", sections, space.into_vectors(), dimension, Vec::new());
        assert!(matches!(
            result,
            Err(RetrieverError::ConsistencyViolation { .. })
        ));
    }

    #[test]
    fn test_new_rejects_extra_vector() {
        let sections = sections();
        let space = VectorSpace::build(&sections);
        let dimension = space.dimension();
        let mut vectors = space.into_vectors();
        vectors.insert("doc:7:1".to_string(), SparseVector::zero(dimension));

        let result = JobIndex::new("job", sections, vectors, dimension, Vec::new());
        assert!(matches!(
            result,
            Err(RetrieverError::ConsistencyViolation { .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_ids_and_wrong_dimension() {
        let mut duplicated = sections();
        duplicated.push(duplicated[0].clone());
        let space = VectorSpace::build(&duplicated);
        let dimension = space.dimension();
        let result = JobIndex::new("job", duplicated, space.into_vectors(), dimension, Vec::new());
        assert!(result.is_err());

        let sections = sections();
        let space = VectorSpace::build(&sections);
        let dimension = space.dimension();
        let result = JobIndex::new("job", sections, space.into_vectors(), dimension + 1, Vec::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_registry_publish_get_remove() {
        let registry = JobIndexRegistry::new();
        assert!(registry.is_empty().await);

        registry.publish(index("job-a")).await.unwrap();
        registry.publish(index("job-b")).await.unwrap();

        assert!(registry.contains("job-a").await);
        assert_eq!(registry.job_ids().await, vec!["job-a", "job-b"]);
        assert_eq!(registry.get("job-b").await.unwrap().job_id(), "job-b");

        assert!(registry.remove("job-a").await.is_some());
        assert!(registry.remove("job-a").await.is_none());
        assert!(registry.get("job-a").await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_registry_rejects_republish() {
        let registry = JobIndexRegistry::new();
        registry.publish(index("job")).await.unwrap();

        let result = registry.publish(index("job")).await;
        assert!(matches!(
            result,
            Err(RetrieverError::ConsistencyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_reader_keeps_index_after_removal() {
        let registry = JobIndexRegistry::new();
        registry.publish(index("job")).await.unwrap();

        let held = registry.get("job").await.unwrap();
        registry.remove("job").await;

        assert_eq!(held.sections().len(), 2);
        assert!(!registry.contains("job").await);
    }
}
