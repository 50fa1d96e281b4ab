use crate::error::ConfigError;
use crate::fuzzy::FuzzyOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Hits fetched per query before resolution, shared by exact and fuzzy search.
pub const DEFAULT_MAX_HITS: usize = 50;

/// Settings for indexing and searching one letter archive.
///
/// Field names follow the archive's properties file, so an existing
/// `{"letters_directory": ..., "index_directory": ..., ...}` JSON loads as is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Base document root; non-default languages live in `<letters_directory>/<language>`.
    pub letters_directory: PathBuf,
    /// Name of the index directory inside each root.
    #[serde(default = "default_index_directory")]
    pub index_directory: String,
    /// Canonical text file inside each numbered letter folder.
    #[serde(default = "default_text_document_name")]
    pub text_document_name: String,
    #[serde(default = "default_language", alias = "defaultlanguage")]
    pub default_language: String,
    /// Path segment that precedes the letter number, e.g. `/Schwartze/`.
    /// Defaults to the final component of `letters_directory`.
    #[serde(default)]
    pub root_marker: Option<String>,
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
    #[serde(default)]
    pub fuzzy: FuzzyOptions,
}

fn default_index_directory() -> String { "index".into() }
fn default_text_document_name() -> String { "tekst.txt".into() }
fn default_language() -> String { "nl".into() }
fn default_max_hits() -> usize { DEFAULT_MAX_HITS }

impl SearchConfig {
    pub fn new<P: Into<PathBuf>>(letters_directory: P) -> Self {
        Self {
            letters_directory: letters_directory.into(),
            index_directory: default_index_directory(),
            text_document_name: default_text_document_name(),
            default_language: default_language(),
            root_marker: None,
            max_hits: default_max_hits(),
            fuzzy: FuzzyOptions::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        if config.root_marker.is_none() && config.root_dir_name().is_none() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: format!(
                    "letters_directory {} has no final name; set root_marker explicitly",
                    config.letters_directory.display()
                ),
            });
        }
        Ok(config)
    }

    fn root_dir_name(&self) -> Option<String> {
        self.letters_directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
    }

    /// Document root for `language`: the base root for `None` or the default language,
    /// `<base>/<language>` otherwise.
    pub fn root_for(&self, language: Option<&str>) -> PathBuf {
        match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(lang) if lang != self.default_language => self.letters_directory.join(lang),
            _ => self.letters_directory.clone(),
        }
    }

    pub fn index_dir_for(&self, language: Option<&str>) -> PathBuf {
        self.root_for(language).join(&self.index_directory)
    }

    pub fn root_marker(&self) -> String {
        match &self.root_marker {
            Some(marker) => marker.clone(),
            None => match self.root_dir_name() {
                Some(name) => format!("/{name}/"),
                None => {
                    warn!(
                        letters_directory = %self.letters_directory.display(),
                        "letters directory has no final name; search hits will not resolve to letters"
                    );
                    "/".into()
                }
            },
        }
    }

    /// Fuzzy options with the shared hit limit applied.
    pub fn fuzzy_options(&self) -> FuzzyOptions {
        FuzzyOptions { limit: self.max_hits, ..self.fuzzy.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_root_resolution() {
        let cfg = SearchConfig::new("/data/Schwartze");
        assert_eq!(cfg.root_for(None), PathBuf::from("/data/Schwartze"));
        assert_eq!(cfg.root_for(Some("nl")), PathBuf::from("/data/Schwartze"));
        assert_eq!(cfg.root_for(Some("en")), PathBuf::from("/data/Schwartze/en"));
        assert_eq!(cfg.index_dir_for(Some("en")), PathBuf::from("/data/Schwartze/en/index"));
        assert_eq!(cfg.root_marker(), "/Schwartze/");
    }

    #[test]
    fn loads_properties_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        fs::write(&path, r#"{"letters_directory": "/srv/letters", "defaultlanguage": "en", "fuzzy": {"max_edits": 1}}"#)
            .unwrap();
        let cfg = SearchConfig::from_file(&path).unwrap();
        assert_eq!(cfg.default_language, "en");
        assert_eq!(cfg.text_document_name, "tekst.txt");
        assert_eq!(cfg.fuzzy.max_edits, 1);
        assert_eq!(cfg.fuzzy.max_expansions, 50);
        assert_eq!(cfg.fuzzy_options().limit, DEFAULT_MAX_HITS);
    }

    #[test]
    fn letters_directory_needs_a_name_or_explicit_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.json");
        fs::write(&path, r#"{"letters_directory": "/"}"#).unwrap();
        assert!(matches!(SearchConfig::from_file(&path), Err(ConfigError::Invalid { .. })));

        fs::write(&path, r#"{"letters_directory": "/", "root_marker": "/brieven/"}"#).unwrap();
        assert_eq!(SearchConfig::from_file(&path).unwrap().root_marker(), "/brieven/");
    }

    #[test]
    fn reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(SearchConfig::from_file(&path), Err(ConfigError::Parse { .. })));
    }
}
