//! Seam to the external letter metadata store. The index only ever reads from it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// A record with the date attribute results are ordered by.
pub trait Dated {
    fn date(&self) -> Option<Date>;
}

pub trait MetadataStore {
    type Record: Dated + Clone;

    fn record_for_identifier(&self, identifier: i32) -> Option<Self::Record>;
}

/// A letter as kept by the metadata store. Fields other than `number` and `date`
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub number: i32,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Letter {
    pub fn new(number: i32, date: Option<Date>) -> Self {
        Self { number, date, extra: serde_json::Map::new() }
    }
}

impl Dated for Letter {
    fn date(&self) -> Option<Date> {
        self.date
    }
}

/// Letters keyed by number, loaded from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct JsonLetterStore {
    letters: HashMap<i32, Letter>,
}

impl JsonLetterStore {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let letters: Vec<Letter> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), letters = letters.len(), "loaded letter metadata");
        Ok(letters.into_iter().collect())
    }
}

impl FromIterator<Letter> for JsonLetterStore {
    fn from_iter<I: IntoIterator<Item = Letter>>(iter: I) -> Self {
        Self { letters: iter.into_iter().map(|l| (l.number, l)).collect() }
    }
}

impl MetadataStore for JsonLetterStore {
    type Record = Letter;

    fn record_for_identifier(&self, identifier: i32) -> Option<Letter> {
        self.letters.get(&identifier).cloned()
    }
}
