//! Turns ranked hits into deduplicated, date-ordered caller records.

use crate::metadata::{Dated, MetadataStore};
use crate::query::Hit;
use crate::store::IndexReader;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Extracts the letter number from a stored document path.
///
/// The number is the segment between the last `root_marker` and the last
/// `/<text_file_name>`. When that segment is itself nested one level
/// (`en/12`), its first three characters are dropped.
#[derive(Debug, Clone)]
pub struct PathIdentifier {
    root_marker: String,
    text_marker: String,
}

impl PathIdentifier {
    pub fn new(root_marker: impl Into<String>, text_file_name: &str) -> Self {
        Self { root_marker: root_marker.into(), text_marker: format!("/{text_file_name}") }
    }

    pub fn extract(&self, path: &str) -> Option<i32> {
        let path = path.replace('\\', "/");
        let start = path.rfind(&self.root_marker)? + self.root_marker.len();
        let end = path.rfind(&self.text_marker)?;
        let segment = path.get(start..end)?;
        let segment = if segment.contains('/') { segment.get(3..)? } else { segment };
        segment.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedRecord<R> {
    Found { identifier: i32, record: R },
    /// The hit's path held no number, or the metadata store had no record for it.
    Unresolved { path: String, identifier: Option<i32> },
}

impl<R: Dated> ResolvedRecord<R> {
    pub fn record(&self) -> Option<&R> {
        match self {
            ResolvedRecord::Found { record, .. } => Some(record),
            ResolvedRecord::Unresolved { .. } => None,
        }
    }

    pub fn identifier(&self) -> Option<i32> {
        match self {
            ResolvedRecord::Found { identifier, .. } => Some(*identifier),
            ResolvedRecord::Unresolved { identifier, .. } => *identifier,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedRecord::Found { .. })
    }

    fn date(&self) -> Option<time::Date> {
        self.record().and_then(Dated::date)
    }
}

/// Resolve hits in rank order, keep the first row per identifier, then stable-sort
/// ascending by date with missing dates first.
pub fn resolve<M: MetadataStore>(
    hits: &[Hit],
    reader: &IndexReader,
    ids: &PathIdentifier,
    metadata: &M,
) -> Vec<ResolvedRecord<M::Record>> {
    let mut seen: HashSet<i32> = HashSet::new();
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(fields) = reader.stored_fields(hit.doc_id) else {
            warn!(doc_id = hit.doc_id, "hit without stored fields");
            continue;
        };
        let identifier = ids.extract(&fields.path);
        if let Some(id) = identifier {
            if !seen.insert(id) {
                continue;
            }
        }
        let row = match identifier.and_then(|id| metadata.record_for_identifier(id).map(|r| (id, r))) {
            Some((identifier, record)) => ResolvedRecord::Found { identifier, record },
            None => {
                warn!(path = %fields.path, ?identifier, "unresolved search hit");
                ResolvedRecord::Unresolved { path: fields.path.clone(), identifier }
            }
        };
        out.push(row);
    }
    out.sort_by_key(|r| r.date());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Document, Segment};
    use crate::metadata::{JsonLetterStore, Letter};
    use time::macros::date;

    fn ids() -> PathIdentifier {
        PathIdentifier::new("/Schwartze/", "tekst.txt")
    }

    #[test]
    fn extracts_numbers() {
        assert_eq!(ids().extract("/data/Schwartze/12/tekst.txt"), Some(12));
        assert_eq!(ids().extract("/data/Schwartze/en/701/tekst.txt"), Some(701));
        assert_eq!(ids().extract("C:\\data\\Schwartze\\5\\tekst.txt"), Some(5));
        assert_eq!(ids().extract("/data/Schwartze/notes/tekst.txt"), None);
        assert_eq!(ids().extract("/elsewhere/12/tekst.txt"), None);
        assert_eq!(ids().extract("/data/Schwartze/12/other.txt"), None);
    }

    fn reader(paths: &[&str]) -> IndexReader {
        let mut seg = Segment::new();
        for p in paths {
            seg.upsert(Document { path: p.to_string(), last_modified: 0, text: "x".into() });
        }
        IndexReader::from_segment(seg)
    }

    fn hits(n: u32) -> Vec<Hit> {
        (0..n).map(|doc_id| Hit { doc_id, score: 1.0 }).collect()
    }

    #[test]
    fn dedupes_and_sorts_by_date_missing_first() {
        let r = reader(&[
            "/d/Schwartze/3/tekst.txt",
            "/d/Schwartze/1/tekst.txt",
            "/d/Schwartze/nl/3/tekst.txt",
            "/d/Schwartze/2/tekst.txt",
        ]);
        let store: JsonLetterStore = vec![
            Letter::new(1, Some(date!(1912 - 01 - 01))),
            Letter::new(2, None),
            Letter::new(3, Some(date!(1905 - 06 - 30))),
        ]
        .into_iter()
        .collect();

        let out = resolve(&hits(4), &r, &ids(), &store);
        let numbers: Vec<Option<i32>> = out.iter().map(|r| r.identifier()).collect();
        assert_eq!(numbers, vec![Some(2), Some(3), Some(1)]);
        assert!(out.iter().all(|r| r.is_resolved()));
    }

    #[test]
    fn unresolved_rows_are_marked_not_dropped() {
        let r = reader(&["/d/Schwartze/1/tekst.txt", "/d/Schwartze/misc/tekst.txt", "/d/Schwartze/9/tekst.txt"]);
        let store: JsonLetterStore = vec![Letter::new(1, Some(date!(1912 - 01 - 01)))].into_iter().collect();

        let out = resolve(&hits(3), &r, &ids(), &store);
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[0],
            ResolvedRecord::Unresolved { path: "/d/Schwartze/misc/tekst.txt".into(), identifier: None }
        );
        assert_eq!(out[1], ResolvedRecord::Unresolved { path: "/d/Schwartze/9/tekst.txt".into(), identifier: Some(9) });
        assert_eq!(out[2].identifier(), Some(1));
    }
}
