//! Per-job orchestration: persist uploads, extract, chunk, vectorize, publish.
//!
//! ## Pipeline
//!
//! ```text
//! uploads → DocumentStore (raw bytes)
//!         → TextExtractor (pages, concurrently per document)
//!         → SectionChunker (per document, docId = jobId_name)
//!         → VectorSpace::build (once, over all sections of the job)
//!         → JobIndex → JobIndexRegistry::publish
//! ```
//!
//! Chunking and vectorization run on a blocking worker thread, so concurrent
//! `analyze` calls for different jobs proceed in parallel. A job becomes
//! visible only when `publish` succeeds; until then `related`, `sections` and
//! `is_indexed` behave as if the job did not exist.
//!
//! Unknown jobs are not errors: `related` and `sections` return empty lists
//! and `delete_job` is a no-op. Callers that must tell "unknown job" from "no
//! related sections" check `is_indexed`.

use super::engine::{RelatedResult, RetrievalEngine};
use super::job_index::{JobIndex, JobIndexRegistry};
use super::vector_space::VectorSpace;
use crate::config::{ExtractionFailurePolicy, RetrieverConfig};
use crate::error::{Result, RetrieverError};
use crate::extraction::{PlainTextExtractor, TextExtractor, UploadedDocument};
use crate::storage::{
    DocumentStore, MemoryDocumentStore, StoredDocument, is_safe_component, sanitize_filename,
};
use futures::future::join_all;
use sectionrank_context::{Section, SectionChunker};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Totals across all published jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatistics {
    pub jobs: usize,
    pub sections: usize,
    pub documents: usize,
    pub vocabulary_terms: usize,
}

/// Builds, serves and deletes job indexes.
pub struct JobIndexStore {
    config: RetrieverConfig,
    chunker: SectionChunker,
    engine: RetrievalEngine,
    registry: Arc<JobIndexRegistry>,
    extractor: Arc<dyn TextExtractor>,
    documents: Arc<dyn DocumentStore>,
}

impl JobIndexStore {
    /// Create a store with its own, empty registry.
    pub fn new(
        config: RetrieverConfig,
        extractor: Arc<dyn TextExtractor>,
        documents: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        Self::with_registry(config, extractor, documents, Arc::new(JobIndexRegistry::new()))
    }

    /// Create a store that publishes into an existing registry.
    pub fn with_registry(
        config: RetrieverConfig,
        extractor: Arc<dyn TextExtractor>,
        documents: Arc<dyn DocumentStore>,
        registry: Arc<JobIndexRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunker: SectionChunker::new(config.chunking.clone()),
            engine: RetrievalEngine::new(
                config.top_k,
                config.similarity_threshold,
                config.snippet_chars,
            ),
            config,
            registry,
            extractor,
            documents,
        })
    }

    /// Plain-text extraction with in-memory document storage.
    pub fn in_memory(config: RetrieverConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(PlainTextExtractor::new()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<JobIndexRegistry> {
        &self.registry
    }

    /// Index a set of uploads as one job and return its id.
    ///
    /// All documents share one vector space. Under
    /// [`ExtractionFailurePolicy::Skip`] a document whose extraction fails is
    /// left out; the job fails only if every document fails. Under
    /// [`ExtractionFailurePolicy::Abort`] the first failure fails the job. A
    /// failed job leaves no index and no stored documents behind.
    pub async fn analyze(&self, uploads: Vec<UploadedDocument>) -> Result<String> {
        if uploads.is_empty() {
            return Err(RetrieverError::invalid_input(
                "analyze requires at least one document",
            ));
        }

        let job_id = Uuid::new_v4().simple().to_string();
        info!("Analyzing {} documents as job {}", uploads.len(), job_id);

        let outcome = match self.build(&job_id, &uploads).await {
            Ok(index) => self.registry.publish(index).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(index) => {
                info!(
                    "Published job {}: {} sections, {} terms",
                    job_id,
                    index.sections().len(),
                    index.vocabulary_size()
                );
                Ok(job_id)
            }
            Err(e) => {
                warn!("Job {} failed: {}", job_id, e);
                if let Err(cleanup) = self.documents.delete_job(&job_id).await {
                    warn!("Failed to remove documents of job {}: {}", job_id, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn build(&self, job_id: &str, uploads: &[UploadedDocument]) -> Result<JobIndex> {
        let names = unique_names(uploads);

        let mut stored = Vec::with_capacity(uploads.len());
        for (upload, name) in uploads.iter().zip(&names) {
            let document = self
                .documents
                .save_document(job_id, name, &upload.bytes)
                .await
                .map_err(RetrieverError::storage)?;
            stored.push(document);
        }

        let extracted = join_all(uploads.iter().map(|u| self.extractor.extract_pages(u))).await;

        let mut documents: Vec<(String, Vec<String>)> = Vec::with_capacity(uploads.len());
        let mut first_failure = None;
        for ((upload, name), result) in uploads.iter().zip(&names).zip(extracted) {
            match result {
                Ok(pages) => documents.push((format!("{job_id}_{name}"), pages)),
                Err(e) => match self.config.extraction_failure {
                    ExtractionFailurePolicy::Abort => {
                        return Err(RetrieverError::extraction(&upload.filename, e));
                    }
                    ExtractionFailurePolicy::Skip => {
                        warn!("Skipping {} in job {}: {:#}", upload.filename, job_id, e);
                        if first_failure.is_none() {
                            first_failure = Some((upload.filename.clone(), e));
                        }
                    }
                },
            }
        }
        if documents.is_empty() {
            if let Some((filename, e)) = first_failure {
                return Err(RetrieverError::extraction(filename, e));
            }
        }

        let chunker = self.chunker.clone();
        let (sections, space) = tokio::task::spawn_blocking(move || {
            let mut sections: Vec<Section> = Vec::new();
            for (doc_id, pages) in &documents {
                let chunked = chunker.chunk(doc_id, pages);
                debug!("Chunked {} into {} sections", doc_id, chunked.len());
                sections.extend(chunked);
            }
            let space = VectorSpace::build(&sections);
            (sections, space)
        })
        .await?;

        debug!(
            "Built vector space for job {}: {} sections, {} terms",
            job_id,
            sections.len(),
            space.dimension()
        );

        let dimension = space.dimension();
        JobIndex::new(job_id, sections, space.into_vectors(), dimension, stored)
    }

    /// Sections related to `section_id`, best first. Empty for unknown jobs.
    pub async fn related(
        &self,
        job_id: &str,
        section_id: &str,
        k: Option<usize>,
    ) -> Vec<RelatedResult> {
        let Some(index) = self.registry.get(job_id).await else {
            return Vec::new();
        };
        self.engine
            .top_k(section_id, index.sections(), index.vectors(), k)
    }

    /// All sections of a job in document, page, chunk order. Empty for
    /// unknown jobs.
    pub async fn sections(&self, job_id: &str) -> Vec<Section> {
        self.registry
            .get(job_id)
            .await
            .map(|index| index.sections().to_vec())
            .unwrap_or_default()
    }

    pub async fn section(&self, job_id: &str, section_id: &str) -> Option<Section> {
        let index = self.registry.get(job_id).await?;
        index.section(section_id).cloned()
    }

    pub async fn is_indexed(&self, job_id: &str) -> bool {
        self.registry
            .get(job_id)
            .await
            .is_some_and(|index| index.sections().len() == index.vectors().len())
    }

    /// Drop a job's index and stored documents. Unknown jobs are a no-op.
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        if self.registry.remove(job_id).await.is_some() {
            info!("Deleted job {}", job_id);
        }
        if !is_safe_component(job_id) {
            return Ok(());
        }
        self.documents
            .delete_job(job_id)
            .await
            .map_err(RetrieverError::storage)
    }

    /// Documents stored for an indexed job.
    pub async fn documents(&self, job_id: &str) -> Vec<StoredDocument> {
        self.registry
            .get(job_id)
            .await
            .map(|index| index.documents().to_vec())
            .unwrap_or_default()
    }

    /// Original bytes of a stored document.
    pub async fn document(&self, job_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        if !is_safe_component(job_id) || !is_safe_component(name) {
            return Ok(None);
        }
        self.documents
            .load_document(job_id, name)
            .await
            .map_err(RetrieverError::storage)
    }

    pub async fn job_ids(&self) -> Vec<String> {
        self.registry.job_ids().await
    }

    pub async fn stats(&self) -> StoreStatistics {
        self.registry
            .snapshot()
            .await
            .iter()
            .fold(StoreStatistics::default(), |mut stats, index| {
                stats.jobs += 1;
                stats.sections += index.sections().len();
                stats.documents += index.documents().len();
                stats.vocabulary_terms += index.vocabulary_size();
                stats
            })
    }
}

/// Sanitized, job-unique storage names for a batch of uploads.
///
/// A repeated name gets `-2`, `-3`, … inserted before its extension.
fn unique_names(uploads: &[UploadedDocument]) -> Vec<String> {
    let mut used = HashSet::new();
    uploads
        .iter()
        .map(|upload| {
            let base = sanitize_filename(&upload.filename);
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = numbered(&base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], n, &name[dot..]),
        _ => format!("{name}-{n}"),
    }
}
