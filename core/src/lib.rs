pub mod config;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod ingest;
pub mod metadata;
pub mod persist;
pub mod query;
pub mod resolve;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use config::SearchConfig;
pub use error::{ConfigError, IndexError, QueryError, StoreError};
pub use fuzzy::{evaluate_fuzzy, FuzzyOptions};
pub use index::{DocId, Document, Posting, StoredFields};
pub use ingest::{index_root, is_document_folder, IndexOutcome, SkippedDocument};
pub use metadata::{Dated, JsonLetterStore, Letter, MetadataStore};
pub use query::{evaluate_exact, Hit};
pub use resolve::{resolve, PathIdentifier, ResolvedRecord};
pub use search::LetterSearch;
pub use store::{IndexReader, IndexStore, IndexWriter, OpenMode};
