use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;

/// A document as handed to the writer. `path` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub text: String,
}

/// Fields kept verbatim for resolution after a match.
pub type StoredFields = Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub freq: u32,
}

/// One committed generation of the index: stored fields plus the inverted index.
///
/// Doc ids are handed out in insertion order and never reused, so appending
/// to a postings list keeps it sorted by `doc_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    pub next_doc_id: DocId,
    pub docs: BTreeMap<DocId, StoredFields>,
    /// Number of terms in each document, used for length normalization.
    pub doc_lengths: HashMap<DocId, u32>,
    pub path_to_doc: HashMap<String, DocId>,
    pub postings: BTreeMap<String, Vec<Posting>>, // postings sorted by doc_id
}

impl Segment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    /// Replace whatever is stored under `doc.path` with `doc`. Returns the new doc id.
    pub fn upsert(&mut self, doc: Document) -> DocId {
        self.remove_path(&doc.path);

        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        let mut tf_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut len = 0u32;
        for term in tokenize(&doc.text) {
            *tf_counts.entry(term).or_insert(0) += 1;
            len += 1;
        }
        for (term, freq) in tf_counts {
            self.postings.entry(term).or_default().push(Posting { doc_id, freq });
        }

        self.doc_lengths.insert(doc_id, len);
        self.path_to_doc.insert(doc.path.clone(), doc_id);
        self.docs.insert(doc_id, doc);
        doc_id
    }

    /// Drop the stored record and every posting for `path`. Returns true if anything was removed.
    pub fn remove_path(&mut self, path: &str) -> bool {
        let Some(old_id) = self.path_to_doc.remove(path) else {
            return false;
        };
        self.doc_lengths.remove(&old_id);
        if let Some(old) = self.docs.remove(&old_id) {
            let mut terms: Vec<String> = tokenize(&old.text).collect();
            terms.sort_unstable();
            terms.dedup();
            for term in terms {
                let now_empty = match self.postings.get_mut(&term) {
                    Some(list) => {
                        list.retain(|p| p.doc_id != old_id);
                        list.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.postings.remove(&term);
                }
            }
        }
        true
    }

    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, text: &str) -> Document {
        Document { path: path.into(), last_modified: 0, text: text.into() }
    }

    #[test]
    fn upsert_replaces_by_path() {
        let mut seg = Segment::new();
        seg.upsert(doc("/a/1/tekst.txt", "hello world"));
        let id = seg.upsert(doc("/a/1/tekst.txt", "goodbye world"));

        assert_eq!(seg.num_docs(), 1);
        assert!(seg.postings_for("hello").is_empty());
        assert_eq!(seg.postings_for("goodbye"), &[Posting { doc_id: id, freq: 1 }]);
        assert_eq!(seg.postings_for("world").len(), 1);
    }

    #[test]
    fn postings_stay_sorted_and_count_frequency() {
        let mut seg = Segment::new();
        seg.upsert(doc("/a/1/tekst.txt", "rust rust systems"));
        seg.upsert(doc("/a/2/tekst.txt", "learning rust"));
        seg.upsert(doc("/a/1/tekst.txt", "rust again"));

        let ids: Vec<DocId> = seg.postings_for("rust").iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(seg.postings_for("systems").is_empty());
        assert_eq!(seg.doc_len(2), 2);
    }
}
