use crate::error::IndexError;
use crate::index::Document;
use crate::store::{IndexStore, IndexWriter, OpenMode};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub cause: String,
}

/// Result of one ingestion run. `skipped` lists documents that failed to read;
/// folders without a text file are not failures and only show up in `folders_without_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexOutcome {
    pub indexed: usize,
    pub skipped: Vec<SkippedDocument>,
    pub folders_without_text: usize,
}

impl IndexOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A directory entry is a document folder if it is a directory holding `text_file_name`.
pub fn is_document_folder(entry: &Path, text_file_name: &str) -> bool {
    entry.is_dir() && entry.join(text_file_name).is_file()
}

/// Upsert one document per immediate subdirectory of `root` that holds `text_file_name`,
/// into the index at `index_dir`, then commit.
///
/// An unreadable root yields an outcome with nothing indexed and the root listed as
/// skipped; the index is left untouched. Store open, writer and commit failures are errors.
pub fn index_root(root: &Path, index_dir: &Path, text_file_name: &str) -> Result<IndexOutcome, IndexError> {
    let root = match std::path::absolute(root).and_then(|abs| fs::read_dir(&abs).map(|_| abs)) {
        Ok(abs) => abs,
        Err(e) => {
            error!(root = %root.display(), error = %e, "cannot read document root, nothing indexed");
            return Ok(IndexOutcome {
                skipped: vec![SkippedDocument { path: root.to_path_buf(), cause: e.to_string() }],
                ..IndexOutcome::default()
            });
        }
    };
    let store = IndexStore::open(index_dir, OpenMode::CreateOrAppend)?;
    let mut writer = store.begin_write()?;
    let outcome = index_folders(&root, text_file_name, &mut writer);
    writer.commit()?;
    info!(
        root = %root.display(),
        indexed = outcome.indexed,
        skipped = outcome.skipped.len(),
        without_text = outcome.folders_without_text,
        "index run complete"
    );
    Ok(outcome)
}

fn index_folders(root: &Path, text_file_name: &str, writer: &mut IndexWriter) -> IndexOutcome {
    let mut outcome = IndexOutcome::default();
    let walker = WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in walker {
        let entry: DirEntry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %e, "cannot read directory entry");
                outcome.skipped.push(SkippedDocument { path, cause: e.to_string() });
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if !is_document_folder(entry.path(), text_file_name) {
            outcome.folders_without_text += 1;
            continue;
        }
        let text_file = entry.path().join(text_file_name);
        match read_document(&text_file) {
            Ok(doc) => {
                writer.upsert(doc);
                outcome.indexed += 1;
            }
            Err(e) => {
                warn!(path = %text_file.display(), error = %e, "skipping unreadable document");
                outcome.skipped.push(SkippedDocument { path: text_file, cause: e.to_string() });
            }
        }
    }
    outcome
}

fn read_document(text_file: &Path) -> std::io::Result<Document> {
    let bytes = fs::read(text_file)?;
    let last_modified = fs::metadata(text_file)?
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    debug!(path = %text_file.display(), bytes = bytes.len(), "read document");
    Ok(Document {
        path: text_file.to_string_lossy().into_owned(),
        last_modified,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_folder_predicate() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1")).unwrap();
        fs::write(dir.path().join("1/tekst.txt"), "hallo").unwrap();
        fs::create_dir(dir.path().join("2")).unwrap();
        fs::write(dir.path().join("loose.txt"), "x").unwrap();
        fs::create_dir_all(dir.path().join("3/tekst.txt")).unwrap();

        assert!(is_document_folder(&dir.path().join("1"), "tekst.txt"));
        assert!(!is_document_folder(&dir.path().join("2"), "tekst.txt"));
        assert!(!is_document_folder(&dir.path().join("loose.txt"), "tekst.txt"));
        assert!(!is_document_folder(&dir.path().join("3"), "tekst.txt"));
    }

    #[test]
    fn missing_root_indexes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("absent");
        let index_dir = dir.path().join("index");
        let outcome = index_root(&root, &index_dir, "tekst.txt").unwrap();
        assert_eq!(outcome.indexed, 0);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].path, root);
        assert!(!outcome.is_complete());
        assert!(!index_dir.exists());
    }
}
