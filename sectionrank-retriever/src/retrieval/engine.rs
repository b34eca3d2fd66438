//! Related-section queries against a built vector space.
//!
//! Every candidate other than the query is scored with the dot product of the
//! two unit vectors (their cosine similarity). Scores below the similarity
//! threshold are dropped; the survivors stream through a [`BoundedHeap`] of
//! capacity `k`.
//!
//! Ties are broken by position in the job's section list: of two sections
//! with the same score, the one that comes first in the list ranks higher.
//! Together with the score this is a total order, so the results for a
//! smaller `k` are always a prefix of the results for a larger `k`.

use super::top_k::BoundedHeap;
use super::vector_space::SparseVector;
use sectionrank_context::Section;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Snippets never cut at a period before this character index.
pub const MIN_SENTENCE_CUT: usize = 80;

const ELLIPSIS: char = '…';

/// One related section, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedResult {
    pub id: String,
    pub doc_id: String,
    pub title: String,
    pub page_number: u32,
    pub snippet: String,
    pub score: f32,
}

/// Scores candidates and selects the best `k`.
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    default_k: usize,
    similarity_threshold: f32,
    snippet_chars: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    position: usize,
}

fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| b.position.cmp(&a.position))
}

impl RetrievalEngine {
    pub fn new(default_k: usize, similarity_threshold: f32, snippet_chars: usize) -> Self {
        Self {
            default_k: default_k.max(1),
            similarity_threshold,
            snippet_chars,
        }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Return up to `k` sections most similar to `query_id`, best first.
    ///
    /// `k` of `None` or `Some(0)` falls back to the configured default. An
    /// unknown query id or an empty section list yields an empty result.
    pub fn top_k(
        &self,
        query_id: &str,
        sections: &[Section],
        vectors: &HashMap<String, SparseVector>,
        k: Option<usize>,
    ) -> Vec<RelatedResult> {
        let k = match k {
            Some(k) if k > 0 => k,
            _ => self.default_k,
        };
        let Some(query) = vectors.get(query_id) else {
            return Vec::new();
        };
        if sections.is_empty() {
            return Vec::new();
        }

        let mut heap = BoundedHeap::new(k.min(sections.len()), rank);
        for (position, section) in sections.iter().enumerate() {
            if section.id == query_id {
                continue;
            }
            let Some(score) = vectors.get(&section.id).and_then(|v| cosine(query, v)) else {
                continue;
            };
            if score < self.similarity_threshold {
                continue;
            }
            heap.push(Candidate { score, position });
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|candidate| {
                let section = &sections[candidate.position];
                RelatedResult {
                    id: section.id.clone(),
                    doc_id: section.doc_id.clone(),
                    title: section.title.clone(),
                    page_number: section.page_number,
                    snippet: snippet(&section.text, self.snippet_chars),
                    score: candidate.score,
                }
            })
            .collect()
    }
}

/// Cosine similarity of two unit vectors, clamped to `[0, 1]`.
///
/// `None` when the dimensions differ.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> Option<f32> {
    a.dot(b).map(|score| score.clamp(0.0, 1.0))
}

/// Excerpt of `text` bounded by `max_chars` characters.
///
/// Text within the limit is returned unchanged. Longer text is cut at the
/// limit; if the cut contains a `.` at character index
/// [`MIN_SENTENCE_CUT`] or later, the excerpt ends at the last such period.
/// Otherwise the cut is returned with an ellipsis appended.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let Some((cut_byte, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let cut = &text[..cut_byte];

    let sentence_end = cut
        .char_indices()
        .enumerate()
        .filter(|&(char_pos, (_, c))| c == '.' && char_pos >= MIN_SENTENCE_CUT)
        .map(|(_, (byte_pos, _))| byte_pos)
        .last();

    match sentence_end {
        Some(byte_pos) => cut[..=byte_pos].to_string(),
        None => format!("{}{}", cut.trim_end(), ELLIPSIS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::vector_space::VectorSpace;

    fn section(id: &str, text: &str) -> Section {
        Section {
            id: id.to_string(),
            doc_id: "doc".to_string(),
            page_number: 1,
            chunk_index: 1,
            title: format!("title of {id}"),
            text: text.to_string(),
        }
    }

    fn engine() -> RetrievalEngine {
        RetrievalEngine::new(3, 0.30, 220)
    }

    fn corpus() -> Vec<Section> {
        vec![
            section("q", "battery storage capacity for grid scale solar farms"),
            section("a", "battery storage capacity for grid scale solar farms"),
            section("b", "grid scale battery storage projects and solar farms"),
            section("c", "quarterly staffing budget for the marketing team"),
            section("d", "solar farms need battery storage"),
            section("e", "holiday party catering menu"),
        ]
    }

    #[test]
    fn test_unknown_query_or_empty_sections() {
        let sections = corpus();
        let space = VectorSpace::build(&sections);
        assert!(engine().top_k("missing", &sections, space.vectors(), None).is_empty());
        assert!(engine().top_k("q", &[], space.vectors(), None).is_empty());
    }

    #[test]
    fn test_excludes_query_and_orders_by_score() {
        let sections = corpus();
        let space = VectorSpace::build(&sections);

        let results = engine().top_k("q", &sections, space.vectors(), Some(10));

        assert!(results.iter().all(|r| r.id != "q"));
        assert_eq!(results[0].id, "a");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_threshold_filters_unrelated_sections() {
        let sections = corpus();
        let space = VectorSpace::build(&sections);
        let engine = engine();

        let results = engine.top_k("q", &sections, space.vectors(), Some(10));

        assert!(results.iter().all(|r| r.score >= engine.similarity_threshold()));
        assert!(results.iter().all(|r| r.id != "c" && r.id != "e"));
    }

    #[test]
    fn test_disjoint_sections_are_not_returned() {
        let sections = vec![
            section("x", "turbine blade inspection"),
            section("y", "payroll spreadsheet formulas"),
        ];
        let space = VectorSpace::build(&sections);

        let score = cosine(space.vector("x").unwrap(), space.vector("y").unwrap());
        assert_eq!(score, Some(0.0));
        assert!(engine().top_k("x", &sections, space.vectors(), None).is_empty());
    }

    #[test]
    fn test_zero_k_uses_default() {
        let sections: Vec<Section> = (0..6)
            .map(|i| section(&format!("s{i}"), "shared vocabulary everywhere"))
            .collect();
        let space = VectorSpace::build(&sections);

        assert_eq!(engine().top_k("s0", &sections, space.vectors(), Some(0)).len(), 3);
        assert_eq!(engine().top_k("s0", &sections, space.vectors(), None).len(), 3);
        assert_eq!(engine().top_k("s0", &sections, space.vectors(), Some(4)).len(), 4);
    }

    #[test]
    fn test_equal_scores_keep_section_order() {
        let sections: Vec<Section> = (0..6)
            .map(|i| section(&format!("s{i}"), "identical text in every section"))
            .collect();
        let space = VectorSpace::build(&sections);

        let results = engine().top_k("s3", &sections, space.vectors(), Some(3));

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s0", "s1", "s2"]);
    }

    #[test]
    fn test_smaller_k_is_prefix_of_larger_k() {
        let sections = corpus();
        let space = VectorSpace::build(&sections);
        let engine = RetrievalEngine::new(3, 0.0, 220);

        let all = engine.top_k("q", &sections, space.vectors(), Some(10));
        for k in 1..=all.len() {
            let some = engine.top_k("q", &sections, space.vectors(), Some(k));
            assert_eq!(some.as_slice(), &all[..k]);
        }
    }

    #[test]
    fn test_skips_vectors_of_other_dimension() {
        let sections = vec![section("q", "alpha beta"), section("x", "alpha beta")];
        let mut vectors = HashMap::new();
        vectors.insert("q".to_string(), SparseVector::from_entries(2, vec![(0, 1.0)]));
        vectors.insert("x".to_string(), SparseVector::from_entries(3, vec![(0, 1.0)]));

        assert!(engine().top_k("q", &sections, &vectors, None).is_empty());
    }

    #[test]
    fn test_result_carries_section_fields() {
        let sections = corpus();
        let space = VectorSpace::build(&sections);

        let results = engine().top_k("q", &sections, space.vectors(), Some(1));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "title of a");
        assert_eq!(results[0].doc_id, "doc");
        assert_eq!(results[0].snippet, sections[1].text);
    }

    #[test]
    fn test_snippet_short_text_verbatim() {
        assert_eq!(snippet("Short text.", 220), "Short text.");
        let exact = "x".repeat(220);
        assert_eq!(snippet(&exact, 220), exact);
    }

    #[test]
    fn test_snippet_prefers_sentence_boundary() {
        let first = format!("{}.", "a".repeat(99)); // period at index 99
        let text = format!("{first} {}", "b".repeat(300));

        assert_eq!(snippet(&text, 220), first);
    }

    #[test]
    fn test_snippet_ignores_early_periods() {
        let text = format!("Intro. {}", "c".repeat(300)); // period at index 5
        let result = snippet(&text, 220);

        assert!(result.ends_with(ELLIPSIS));
        assert_eq!(result.chars().count(), 221);
        assert!(result.starts_with("Intro. ccc"));
    }

    #[test]
    fn test_snippet_period_exactly_at_boundary() {
        let text = format!("{}.{}", "d".repeat(80), "e".repeat(300)); // period at index 80
        assert_eq!(snippet(&text, 220), format!("{}.", "d".repeat(80)));

        let text = format!("{}.{}", "d".repeat(79), "e".repeat(300)); // period at index 79
        assert!(snippet(&text, 220).ends_with(ELLIPSIS));
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let text = "é".repeat(300);
        let result = snippet(&text, 220);
        assert_eq!(result.chars().count(), 221);
    }
}
