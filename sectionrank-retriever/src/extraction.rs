//! Page text extraction seam.
//!
//! The job index store never parses document formats itself. It hands each
//! upload to a [`TextExtractor`] and receives the ordered text of every page.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use sectionrank_context::split_pages;

/// A raw upload: original filename plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an upload from disk, using the file name as the filename.
    pub async fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Path has no file name: {}", path.display()))?;
        Ok(Self { filename, bytes })
    }
}

/// Turns a document's bytes into per-page text, first page first.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_pages(&self, document: &UploadedDocument) -> Result<Vec<String>>;
}

/// Extractor for text that was already pulled out of its source format.
///
/// The bytes must be UTF-8. Pages are separated by form feeds, which is what
/// `pdftotext` and similar tools write. PDF payloads are rejected since
/// parsing them needs a dedicated extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_pages(&self, document: &UploadedDocument) -> Result<Vec<String>> {
        if document.bytes.starts_with(b"%PDF") {
            bail!(
                "{} is a PDF; configure a PDF-capable extractor",
                document.filename
            );
        }
        let text = std::str::from_utf8(&document.bytes)
            .map_err(|e| anyhow!("{} is not valid UTF-8: {e}", document.filename))?;
        Ok(split_pages(text).into_iter().map(str::to_string).collect())
    }
}
