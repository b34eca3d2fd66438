//! This module turns extracted page text into overlapping word windows
//! ("sections") that the retriever can index.
//!
//! Each page is processed independently:
//!
//! 1. Whitespace runs are collapsed, so the page becomes a flat list of words.
//! 2. The word list is cut into windows of `target_words` words. Consecutive
//!    windows overlap by `overlap_words` words, i.e. the window start advances
//!    by `max(1, target_words - overlap_words)`.
//! 3. Windows shorter than `min_chunk_chars` characters are dropped.
//!
//! Chunk indices start at 1 on every page and only count retained windows, so
//! a section id `doc:page:chunk` always refers to a section that exists.
//!
//! # Usage
//!
//! ```
//! use sectionrank_context::chunker::{ChunkingConfig, SectionChunker};
//!
//! let config = ChunkingConfig::default()
//!     .with_target_words(50)
//!     .with_overlap_words(10)
//!     .with_min_chunk_chars(20);
//! let chunker = SectionChunker::new(config);
//!
//! let page = "lorem ipsum dolor sit amet ".repeat(20);
//! let sections = chunker.chunk("job_notes.txt", &[page.as_str(), "", "   "]);
//!
//! // 100 words, windows of 50 advancing by 40: [0, 50), [40, 90), [80, 100)
//! assert_eq!(sections.len(), 3);
//! assert_eq!(sections[0].id, "job_notes.txt:1:1");
//! assert_eq!(sections[2].id, "job_notes.txt:1:3");
//! // Blank pages produce nothing.
//! assert!(sections.iter().all(|s| s.page_number == 1));
//! ```

use crate::section::Section;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Page separator emitted by text extraction tools such as `pdftotext`.
pub const PAGE_SEPARATOR: char = '\u{000C}';

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Tunables for the windowing algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingConfig {
    /// Words per window
    pub target_words: usize,
    /// Words shared by consecutive windows
    pub overlap_words: usize,
    /// Windows with fewer characters than this are discarded
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_words: 300,
            overlap_words: 120,
            min_chunk_chars: 160,
        }
    }
}

impl ChunkingConfig {
    pub fn with_target_words(mut self, target_words: usize) -> Self {
        self.target_words = target_words;
        self
    }

    pub fn with_overlap_words(mut self, overlap_words: usize) -> Self {
        self.overlap_words = overlap_words;
        self
    }

    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// How far the window start advances between consecutive windows.
    pub fn step(&self) -> usize {
        self.target_words.saturating_sub(self.overlap_words).max(1)
    }
}

/// Splits documents into sections. Holds no state besides its configuration,
/// so identical input always yields identical output.
#[derive(Debug, Clone, Default)]
pub struct SectionChunker {
    config: ChunkingConfig,
}

impl SectionChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk every page of one document.
    ///
    /// Pages are numbered from 1 in the order given. The returned sections are
    /// in ascending `(page_number, chunk_index)` order.
    pub fn chunk<S: AsRef<str>>(&self, doc_id: &str, pages: &[S]) -> Vec<Section> {
        let mut sections = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            let page_number = (page_idx + 1) as u32;
            sections.extend(self.chunk_page(doc_id, page_number, page.as_ref()));
        }
        sections
    }

    /// Chunk a single page's text.
    pub fn chunk_page(&self, doc_id: &str, page_number: u32, text: &str) -> Vec<Section> {
        let cleaned = collapse_whitespace(text);
        if cleaned.is_empty() || self.config.target_words == 0 {
            return Vec::new();
        }

        let words: Vec<&str> = cleaned.split(' ').collect();
        let step = self.config.step();
        let mut sections = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.config.target_words).min(words.len());
            let window = words[start..end].join(" ");
            if window.chars().count() >= self.config.min_chunk_chars {
                let chunk_index = (sections.len() + 1) as u32;
                sections.push(Section::new(doc_id, page_number, chunk_index, window));
            }
            if end == words.len() {
                break;
            }
            start += step;
        }

        sections
    }
}

/// Collapse all whitespace runs into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Split a plain-text dump into pages on form feed characters.
///
/// A trailing form feed (as `pdftotext` writes after the last page) does not
/// produce an extra empty page.
pub fn split_pages(text: &str) -> Vec<&str> {
    let text = text.strip_suffix(PAGE_SEPARATOR).unwrap_or(text);
    text.split(PAGE_SEPARATOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_single_full_window_page() {
        let chunker = SectionChunker::default();
        let page = numbered_words(300);

        let sections = chunker.chunk("doc", &[page.as_str()]);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "doc:1:1");
        assert_eq!(sections[0].text.split(' ').count(), 300);
        assert_eq!(sections[0].text, page);
    }

    #[test]
    fn test_windows_overlap_by_configured_words() {
        let chunker = SectionChunker::new(
            ChunkingConfig::default()
                .with_target_words(10)
                .with_overlap_words(4)
                .with_min_chunk_chars(1),
        );
        let page = numbered_words(22);

        let sections = chunker.chunk("doc", &[page.as_str()]);

        // starts at 0, 6, 12; the window starting at 12 reaches word 21
        assert_eq!(sections.len(), 3);
        let first: Vec<&str> = sections[0].text.split(' ').collect();
        let second: Vec<&str> = sections[1].text.split(' ').collect();
        let third: Vec<&str> = sections[2].text.split(' ').collect();
        assert_eq!(first.len(), 10);
        assert_eq!(&first[6..], &second[..4]);
        assert_eq!(second[0], "word6");
        assert_eq!(third[0], "word12");
        assert_eq!(third.len(), 10);
        assert_eq!(*third.last().unwrap(), "word21");
    }

    #[test]
    fn test_short_final_window() {
        let chunker = SectionChunker::new(
            ChunkingConfig::default()
                .with_target_words(10)
                .with_overlap_words(2)
                .with_min_chunk_chars(1),
        );
        let page = numbered_words(13);

        let sections = chunker.chunk("doc", &[page.as_str()]);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].text.split(' ').count(), 5);
        assert!(sections[1].text.starts_with("word8 "));
    }

    #[test]
    fn test_overlap_not_smaller_than_target_still_advances() {
        let config = ChunkingConfig::default()
            .with_target_words(3)
            .with_overlap_words(5)
            .with_min_chunk_chars(1);
        assert_eq!(config.step(), 1);

        let sections = SectionChunker::new(config).chunk("doc", &["a b c d e"]);

        let texts: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a b c", "b c d", "c d e"]);
    }

    #[test]
    fn test_blank_pages_yield_nothing() {
        let chunker = SectionChunker::default();
        let sections = chunker.chunk("doc", &["", "  \n\t ", "\u{000C}"]);
        assert!(sections.is_empty());
    }

    #[test]
    fn test_page_shorter_than_min_chars_yields_nothing() {
        let chunker = SectionChunker::default();
        let short = "a handful of words that stay well below the character floor";
        assert!(short.len() < chunker.config().min_chunk_chars);

        assert!(chunker.chunk("doc", &[short]).is_empty());
    }

    #[test]
    fn test_chunk_index_counts_retained_windows_only() {
        let chunker = SectionChunker::new(
            ChunkingConfig::default()
                .with_target_words(4)
                .with_overlap_words(0)
                .with_min_chunk_chars(15),
        );
        // windows: "alpha beta gamma delta" (22), "x y z w" (7, dropped), "epsilon zeta eta theta" (22)
        let page = "alpha beta gamma delta x y z w epsilon zeta eta theta";

        let sections = chunker.chunk("doc", &[page]);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "doc:1:1");
        assert_eq!(sections[1].id, "doc:1:2");
        assert_eq!(sections[1].text, "epsilon zeta eta theta");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let chunker = SectionChunker::new(ChunkingConfig::default().with_min_chunk_chars(1));
        let sections = chunker.chunk("doc", &["  first\n\nsecond\t\tthird  "]);
        assert_eq!(sections[0].text, "first second third");
    }

    #[test]
    fn test_ids_unique_and_ordered_across_pages() {
        let chunker = SectionChunker::new(
            ChunkingConfig::default()
                .with_target_words(5)
                .with_overlap_words(2)
                .with_min_chunk_chars(1),
        );
        let page = numbered_words(17);
        let pages = vec![page.as_str(), "", page.as_str()];

        let sections = chunker.chunk("doc", &pages);

        let mut ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);

        for pair in sections.windows(2) {
            assert!(pair[0].position() < pair[1].position());
        }
        assert!(sections.iter().all(|s| s.page_number != 2));
        assert!(sections.iter().any(|s| s.page_number == 3));
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = SectionChunker::new(ChunkingConfig::default().with_target_words(40));
        let page = numbered_words(500);
        let pages = [page.as_str()];
        assert_eq!(chunker.chunk("doc", &pages), chunker.chunk("doc", &pages));
    }

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages("one\u{000C}two\u{000C}"), vec!["one", "two"]);
        assert_eq!(split_pages("one\u{000C}\u{000C}three"), vec!["one", "", "three"]);
        assert_eq!(split_pages("single"), vec!["single"]);
    }
}
