//! Fuzzy query - matches indexed terms within a Levenshtein edit distance.

use crate::error::QueryError;
use crate::index::DocId;
use crate::query::{top_hits, Hit};
use crate::store::IndexReader;
use crate::tokenizer::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FuzzyOptions {
    /// Maximum edit distance (default: 2)
    #[serde(default = "default_max_edits")]
    pub max_edits: u32,
    /// Number of initial characters that must match exactly (default: 0)
    #[serde(default)]
    pub prefix_length: usize,
    /// Maximum number of matching terms to expand, closest first (default: 50)
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_max_edits() -> u32 { 2 }
fn default_max_expansions() -> usize { 50 }
fn default_limit() -> usize { crate::config::DEFAULT_MAX_HITS }

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            max_edits: default_max_edits(),
            prefix_length: 0,
            max_expansions: default_max_expansions(),
            limit: default_limit(),
        }
    }
}

/// Levenshtein distance over chars, or `None` once it provably exceeds `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: u32) -> Option<u32> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = max as usize;
    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
            row_min = row_min.min(cur[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    let d = prev[b.len()];
    (d <= max).then_some(d as u32)
}

/// Expand `term` to every indexed term within `opts.max_edits` and score the union
/// of their postings by `(1 + max_edits - distance) * (1 + ln tf)`.
pub fn evaluate_fuzzy(term: &str, reader: &IndexReader, opts: &FuzzyOptions) -> Result<Vec<Hit>, QueryError> {
    let term = normalize(term.trim());
    if term.is_empty() {
        return Err(QueryError::Empty);
    }
    let prefix: String = term.chars().take(opts.prefix_length).collect();

    let mut matched: Vec<(u32, &str)> = reader
        .all_terms()
        .filter(|t| t.starts_with(prefix.as_str()))
        .filter_map(|t| bounded_levenshtein(&term, t, opts.max_edits).map(|d| (d, t)))
        .collect();
    // all_terms is sorted, so a stable sort on distance keeps term order among equals.
    matched.sort_by_key(|(d, _)| *d);
    matched.truncate(opts.max_expansions);

    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for (distance, t) in &matched {
        let closeness = (opts.max_edits - distance) as f32;
        for p in reader.postings_for(t) {
            let tf = 1.0 + (p.freq as f32).ln();
            *scores.entry(p.doc_id).or_insert(0.0) += (1.0 + closeness) * tf;
        }
    }
    tracing::debug!(term = %term, expansions = matched.len(), candidates = scores.len(), "fuzzy query evaluated");
    Ok(top_hits(scores, opts.limit))
}
