use crate::error::QueryError;
use crate::index::DocId;
use crate::store::IndexReader;
use crate::tokenizer::tokenize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub doc_id: DocId,
    pub score: f32,
}

/// Descending score, ties by ascending doc id (insertion order), truncated to `limit`.
pub(crate) fn top_hits(scores: HashMap<DocId, f32>, limit: usize) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scores.into_iter().map(|(doc_id, score)| Hit { doc_id, score }).collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.doc_id.cmp(&b.doc_id))
    });
    hits.truncate(limit);
    hits
}

/// OR of the query's terms, scored tf-idf style:
/// `Σ qtf · (1 + ln tf) · idf² / √len` with `idf = 1 + ln(N / df)`.
pub fn evaluate_exact(query: &str, reader: &IndexReader, limit: usize) -> Result<Vec<Hit>, QueryError> {
    if query.trim().is_empty() {
        return Err(QueryError::Empty);
    }
    let mut tf_q: BTreeMap<String, u32> = BTreeMap::new();
    for term in tokenize(query) {
        *tf_q.entry(term).or_insert(0) += 1;
    }
    if tf_q.is_empty() {
        return Err(QueryError::NoTerms { query: query.to_string() });
    }

    let n = reader.num_docs().max(1) as f32;
    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for (term, qtf) in &tf_q {
        let postings = reader.postings_for(term);
        if postings.is_empty() {
            continue;
        }
        let idf = 1.0 + (n / postings.len() as f32).ln();
        for p in postings {
            let tf = 1.0 + (p.freq as f32).ln();
            let norm = (reader.doc_len(p.doc_id).max(1) as f32).sqrt();
            *scores.entry(p.doc_id).or_insert(0.0) += *qtf as f32 * tf * idf * idf / norm;
        }
    }
    tracing::debug!(query, terms = tf_q.len(), candidates = scores.len(), "exact query evaluated");
    Ok(top_hits(scores, limit))
}
