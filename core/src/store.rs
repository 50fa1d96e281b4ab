//! On-disk index store with a single writer and point-in-time readers.
//!
//! Every commit writes a complete new generation (`segment_<n>.bin`) and then
//! atomically swaps `meta.json` to point at it. Readers load whichever
//! generation `meta.json` names at open time and never see later commits.
//! The writer holds an exclusive advisory lock on `write.lock` for its whole
//! lifetime, so a second writer fails instead of interleaving upserts.

use crate::error::StoreError;
use crate::index::{DocId, Document, Posting, Segment, StoredFields};
use crate::persist::{
    load_meta, load_segment, now_rfc3339, prune_segments, save_meta, save_segment, IndexPaths, MetaFile,
    FORMAT_VERSION,
};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const READER_OPEN_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Discard any existing index and start empty.
    Create,
    /// Open an existing index; fail if there is none.
    Append,
    CreateOrAppend,
}

#[derive(Debug)]
pub struct IndexStore {
    paths: IndexPaths,
    writer_open: Arc<Mutex<bool>>,
}

impl IndexStore {
    /// Open the index directory at `path`.
    ///
    /// Opening never waits on or checks `write.lock` for an existing index, so
    /// readers can open while a writer is active. Writer contention surfaces as
    /// `WriterActive` from `begin_write`, and from `open` itself only when it must
    /// write (`Create`, or `CreateOrAppend` on an empty directory).
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        if mode != OpenMode::Append {
            fs::create_dir_all(&root).map_err(|source| StoreError::Open { path: root.clone(), source })?;
        }
        let md = fs::metadata(&root).map_err(|source| match mode {
            OpenMode::Append if source.kind() == io::ErrorKind::NotFound => StoreError::Missing { path: root.clone() },
            _ => StoreError::Open { path: root.clone(), source },
        })?;
        if !md.is_dir() {
            return Err(StoreError::Open {
                path: root,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let store = Self { paths: IndexPaths::new(&root), writer_open: Arc::new(Mutex::new(false)) };
        let meta = load_meta(&store.paths).map_err(|e| StoreError::Corrupt { path: root.clone(), reason: e.to_string() })?;
        match (mode, meta) {
            (OpenMode::Append, None) => return Err(StoreError::Missing { path: root }),
            (OpenMode::Create, _) | (OpenMode::CreateOrAppend, None) => {
                let mut writer = store.begin_write()?;
                writer.clear();
                writer.commit()?;
                info!(path = %root.display(), "initialized empty index");
            }
            (_, Some(meta)) => {
                if !store.paths.segment(meta.generation).exists() {
                    return Err(StoreError::Corrupt {
                        path: root,
                        reason: format!("segment for generation {} is missing", meta.generation),
                    });
                }
                debug!(path = %root.display(), generation = meta.generation, num_docs = meta.num_docs, "opened index");
            }
        }
        Ok(store)
    }

    /// Take the single writer slot. Fails immediately with `WriterActive` if it is taken,
    /// in this process or any other.
    pub fn begin_write(&self) -> Result<IndexWriter, StoreError> {
        let mut open = self.writer_open.lock();
        if *open {
            return Err(StoreError::WriterActive { path: self.paths.root.clone() });
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.paths.lock())?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::WriterActive { path: self.paths.root.clone() })?;

        let (base_generation, segment) = match load_meta(&self.paths)? {
            Some(meta) => (meta.generation, load_segment(&self.paths, meta.generation)?),
            None => (0, Segment::new()),
        };
        *open = true;
        Ok(IndexWriter {
            paths: self.paths.clone(),
            base_generation,
            segment,
            lock_file,
            writer_open: Arc::clone(&self.writer_open),
        })
    }

    pub fn open_reader(&self) -> Result<IndexReader, StoreError> {
        IndexReader::open(&self.paths)
    }
}

/// Exclusive writer. Changes become visible to readers opened after `commit`.
/// Dropping without committing discards them.
#[derive(Debug)]
pub struct IndexWriter {
    paths: IndexPaths,
    base_generation: u64,
    segment: Segment,
    lock_file: File,
    writer_open: Arc<Mutex<bool>>,
}

impl IndexWriter {
    /// Delete any record stored under `doc.path`, then insert `doc`.
    pub fn upsert(&mut self, doc: Document) -> DocId {
        debug!(path = %doc.path, "upsert");
        self.segment.upsert(doc)
    }

    pub fn delete_path(&mut self, path: &str) -> bool {
        self.segment.remove_path(path)
    }

    pub fn clear(&mut self) {
        self.segment = Segment::new();
    }

    /// Durably write a new generation and publish it. Returns the generation number.
    pub fn commit(self) -> Result<u64, StoreError> {
        let generation = self.base_generation + 1;
        save_segment(&self.paths, generation, &self.segment)?;
        let meta = MetaFile {
            version: FORMAT_VERSION,
            generation,
            num_docs: self.segment.num_docs(),
            committed_at: now_rfc3339(),
        };
        save_meta(&self.paths, &meta)?;
        // Keep the previous generation around for readers that raced this commit.
        if let Err(e) = prune_segments(&self.paths, generation.saturating_sub(1)) {
            warn!(error = %e, "failed to prune old segments");
        }
        info!(generation, num_docs = meta.num_docs, "index committed");
        Ok(generation)
    }

    pub fn rollback(self) {
        debug!(generation = self.base_generation, "writer rolled back");
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
        *self.writer_open.lock() = false;
    }
}

/// Read-only snapshot of one committed generation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IndexReader {
    generation: u64,
    segment: Arc<Segment>,
}

impl IndexReader {
    fn open(paths: &IndexPaths) -> Result<Self, StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let meta = load_meta(paths)?.ok_or_else(|| StoreError::Missing { path: paths.root.clone() })?;
            match load_segment(paths, meta.generation) {
                Ok(segment) => return Ok(Self { generation: meta.generation, segment: Arc::new(segment) }),
                // A commit pruned the generation between reading meta and the segment.
                Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound && attempt < READER_OPEN_ATTEMPTS => {
                    debug!(generation = meta.generation, attempt, "segment superseded, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wrap an in-memory segment, bypassing the filesystem.
    pub fn from_segment(segment: Segment) -> Self {
        Self { generation: 0, segment: Arc::new(segment) }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn num_docs(&self) -> u32 {
        self.segment.num_docs()
    }

    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.segment.postings_for(term)
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings_for(term).len() as u32
    }

    /// All indexed terms in lexicographic order.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.segment.postings.keys().map(String::as_str)
    }

    pub fn stored_fields(&self, doc_id: DocId) -> Option<&StoredFields> {
        self.segment.docs.get(&doc_id)
    }

    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.segment.doc_len(doc_id)
    }
}
