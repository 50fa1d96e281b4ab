use crate::error::StoreError;
use crate::index::Segment;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub generation: u64,
    pub num_docs: u32,
    pub committed_at: String,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn lock(&self) -> PathBuf { self.root.join("write.lock") }
    pub fn segment(&self, generation: u64) -> PathBuf {
        self.root.join(format!("segment_{generation:08}.bin"))
    }
}

/// Write `bytes` next to `target`, fsync, then rename over it.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = target.with_extension("tmp");
    {
        let mut f = BufWriter::new(File::create(&tmp)?);
        f.write_all(bytes)?;
        f.flush()?;
        f.get_ref().sync_all()?;
    }
    fs::rename(&tmp, target)?;
    Ok(())
}

pub fn save_segment(paths: &IndexPaths, generation: u64, segment: &Segment) -> Result<(), StoreError> {
    let bytes = bincode::serialize(segment)?;
    write_atomic(&paths.segment(generation), &bytes)
}

pub fn load_segment(paths: &IndexPaths, generation: u64) -> Result<Segment, StoreError> {
    let f = File::open(paths.segment(generation))?;
    let segment = bincode::deserialize_from(BufReader::new(f))?;
    Ok(segment)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())
}

/// `Ok(None)` when no index has been committed in this directory yet.
pub fn load_meta(paths: &IndexPaths) -> Result<Option<MetaFile>, StoreError> {
    let buf = match fs::read_to_string(paths.meta()) {
        Ok(buf) => buf,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version > FORMAT_VERSION {
        return Err(StoreError::Corrupt {
            path: paths.meta(),
            reason: format!("unsupported format version {}", meta.version),
        });
    }
    Ok(Some(meta))
}

/// Remove segment files older than `keep_from`.
pub fn prune_segments(paths: &IndexPaths, keep_from: u64) -> Result<usize, StoreError> {
    let mut removed = 0;
    for entry in fs::read_dir(&paths.root)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(generation) = name
            .to_str()
            .and_then(|n| n.strip_prefix("segment_"))
            .and_then(|n| n.strip_suffix(".bin"))
            .and_then(|n| n.parse::<u64>().ok())
        else {
            continue;
        };
        if generation < keep_from {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into())
}
