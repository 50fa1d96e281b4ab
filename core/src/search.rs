//! The three operations collaborators call: index, exact search, fuzzy search.

use crate::config::SearchConfig;
use crate::error::{IndexError, QueryError};
use crate::fuzzy::evaluate_fuzzy;
use crate::ingest::{index_root, IndexOutcome};
use crate::metadata::MetadataStore;
use crate::query::{evaluate_exact, Hit};
use crate::resolve::{resolve, PathIdentifier, ResolvedRecord};
use crate::store::{IndexReader, IndexStore, OpenMode};
use tracing::info;

pub struct LetterSearch<M> {
    config: SearchConfig,
    ids: PathIdentifier,
    metadata: M,
}

impl<M: MetadataStore> LetterSearch<M> {
    pub fn new(config: SearchConfig, metadata: M) -> Self {
        let ids = PathIdentifier::new(config.root_marker(), &config.text_document_name);
        Self { config, ids, metadata }
    }

    /// Build or update the index of the root for `language`.
    pub fn index_files(&self, language: Option<&str>) -> Result<IndexOutcome, IndexError> {
        let root = self.config.root_for(language);
        let index_dir = self.config.index_dir_for(language);
        info!(root = %root.display(), ?language, "indexing letters");
        index_root(&root, &index_dir, &self.config.text_document_name)
    }

    pub fn search(&self, query: &str, language: Option<&str>) -> Result<Vec<ResolvedRecord<M::Record>>, QueryError> {
        let reader = self.open_reader(language)?;
        let hits = evaluate_exact(query, &reader, self.config.max_hits)?;
        Ok(self.finish(query, &hits, &reader))
    }

    /// Edit-distance search on a single literal term.
    pub fn fuzzy_search(&self, term: &str, language: Option<&str>) -> Result<Vec<ResolvedRecord<M::Record>>, QueryError> {
        let reader = self.open_reader(language)?;
        let hits = evaluate_fuzzy(term, &reader, &self.config.fuzzy_options())?;
        Ok(self.finish(term, &hits, &reader))
    }

    fn open_reader(&self, language: Option<&str>) -> Result<IndexReader, QueryError> {
        let store = IndexStore::open(self.config.index_dir_for(language), OpenMode::Append)?;
        Ok(store.open_reader()?)
    }

    fn finish(&self, query: &str, hits: &[Hit], reader: &IndexReader) -> Vec<ResolvedRecord<M::Record>> {
        let rows = resolve(hits, reader, &self.ids, &self.metadata);
        info!(query, hits = hits.len(), rows = rows.len(), generation = reader.generation(), "search complete");
        rows
    }
}
