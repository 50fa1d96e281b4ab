//! Error types for the letter index.

use std::path::PathBuf;
use thiserror::Error;

/// Index store errors. `Open` and `WriterActive` are fatal to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot open index at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index at {path} already has an active writer")]
    WriterActive { path: PathBuf },

    #[error("no index exists at {path}")]
    Missing { path: PathBuf },

    #[error("index at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("segment codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("meta file error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Query evaluation errors. The first two are parse failures.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    #[error("query {query:?} contains no searchable terms")]
    NoTerms { query: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, QueryError::Empty | QueryError::NoTerms { .. })
    }
}

/// Errors that abort an ingestion run as a whole.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
