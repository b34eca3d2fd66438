//! TF-IDF vector space over all sections of one job.
//!
//! Document frequencies are counted across the combined section list of every
//! document uploaded to the job, so sections of different files share one
//! vocabulary and one set of IDF weights. Adding a document afterwards would
//! change `N` and every `df`, which is why a job's space is built exactly once.
//!
//! ```text
//! idf(t)        = ln(1 + N / (1 + df(t)))        N = max(1, #sections)
//! weight(t, s)  = count(t, s) / max_count(s) * idf(t)
//! vector(s)     = weight(., s) / ||weight(., s)||₂
//! ```

use super::tokenizer::tokenize;
use sectionrank_context::Section;
use std::collections::{BTreeMap, HashMap};

/// A vector over the job vocabulary that only stores non-zero components.
///
/// Entries are sorted by term index, which keeps dot products a linear merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dimension: usize,
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    pub fn zero(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build a vector from `(index, weight)` pairs. Pairs are sorted by index;
    /// zero weights are dropped.
    pub fn from_entries(dimension: usize, mut entries: Vec<(u32, f32)>) -> Self {
        entries.retain(|&(_, weight)| weight != 0.0);
        entries.sort_by_key(|&(index, _)| index);
        debug_assert!(entries.iter().all(|&(index, _)| (index as usize) < dimension));
        Self { dimension, entries }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.entries
            .iter()
            .map(|&(_, w)| w * w)
            .sum::<f32>()
            .sqrt()
    }

    /// Component at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f32 {
        self.entries
            .binary_search_by_key(&(index as u32), |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product of two vectors of the same dimension, `None` otherwise.
    pub fn dot(&self, other: &SparseVector) -> Option<f32> {
        if self.dimension != other.dimension {
            return None;
        }
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_index, a_weight) = self.entries[i];
            let (b_index, b_weight) = other.entries[j];
            match a_index.cmp(&b_index) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }
        Some(sum)
    }

    /// Expand into a dense vector of length `dimension`.
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dimension];
        for &(index, weight) in &self.entries {
            dense[index as usize] = weight;
        }
        dense
    }
}

/// Vocabulary, IDF weights and one L2-normalized vector per section.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    vocabulary: Vec<String>,
    term_index: HashMap<String, usize>,
    idf: Vec<f32>,
    vectors: HashMap<String, SparseVector>,
}

impl VectorSpace {
    /// Build the space over the complete section list of a job.
    pub fn build(sections: &[Section]) -> Self {
        let term_counts: Vec<HashMap<String, u32>> = sections
            .iter()
            .map(|section| {
                let mut counts = HashMap::new();
                for token in tokenize(&section.text) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // BTreeMap yields the vocabulary in lexicographic order
        let mut document_frequency: BTreeMap<&str, u32> = BTreeMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = sections.len().max(1) as f64;
        let vocabulary: Vec<String> = document_frequency.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f32> = document_frequency
            .values()
            .map(|&df| (1.0 + n / (1.0 + df as f64)).ln() as f32)
            .collect();
        let term_index: HashMap<String, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();

        let dimension = vocabulary.len();
        let vectors = sections
            .iter()
            .zip(&term_counts)
            .map(|(section, counts)| {
                let vector = weigh(counts, &term_index, &idf, dimension);
                (section.id.clone(), vector)
            })
            .collect();

        Self {
            vocabulary,
            term_index,
            idf,
            vectors,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_index.get(term).map(|&index| self.idf[index])
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.term_index.get(term).copied()
    }

    pub fn vector(&self, section_id: &str) -> Option<&SparseVector> {
        self.vectors.get(section_id)
    }

    pub fn vectors(&self) -> &HashMap<String, SparseVector> {
        &self.vectors
    }

    pub fn into_vectors(self) -> HashMap<String, SparseVector> {
        self.vectors
    }
}

fn weigh(
    counts: &HashMap<String, u32>,
    term_index: &HashMap<String, usize>,
    idf: &[f32],
    dimension: usize,
) -> SparseVector {
    let Some(&max_count) = counts.values().max() else {
        return SparseVector::zero(dimension);
    };

    let weights: Vec<(u32, f64)> = counts
        .iter()
        .filter_map(|(term, &count)| {
            let index = *term_index.get(term)?;
            let tf = count as f64 / max_count as f64;
            Some((index as u32, tf * idf[index] as f64))
        })
        .collect();

    let norm = weights.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return SparseVector::zero(dimension);
    }

    let entries = weights
        .into_iter()
        .map(|(index, w)| (index, (w / norm) as f32))
        .collect();
    SparseVector::from_entries(dimension, entries)
}
