//
// file_cache.rs
//
// Modification-time keyed cache of per-file candidates
//

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::candidate::Candidate;
use crate::error::ScanError;

/// Candidates extracted from one file, with the mtime they were extracted at.
///
/// The time and the candidates live in one value so a rescan replaces both
/// together or neither.
#[derive(Debug, Clone)]
struct CachedFile {
    mtime: SystemTime,
    candidates: Vec<Candidate>,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// File unchanged since it was last scanned
    Hit(Vec<Candidate>),
    /// File never scanned, or modified since; `mtime` is the time to store
    /// alongside the fresh extraction
    Miss { mtime: SystemTime },
}

/// Per-session file cache.
///
/// Entries are never evicted: the cache lives as long as the editing session
/// and document sets are small.
#[derive(Debug, Default)]
pub struct FileCache {
    files: HashMap<PathBuf, CachedFile>,
    hits: u64,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `path` against its current modification time.
    ///
    /// A recorded time equal to or newer than the file's current time is a
    /// hit and bumps the hit counter. Errors only when the file's metadata
    /// cannot be read (e.g. it was deleted after enumeration).
    pub fn check(&mut self, path: &Path) -> Result<CacheLookup, ScanError> {
        let mtime = file_mtime(path)?;
        match self.files.get(path) {
            Some(cached) if mtime <= cached.mtime => {
                self.hits += 1;
                log::trace!("Cache hit for {}", path.display());
                Ok(CacheLookup::Hit(cached.candidates.clone()))
            }
            Some(_) => {
                log::trace!("Cache stale for {}", path.display());
                Ok(CacheLookup::Miss { mtime })
            }
            None => Ok(CacheLookup::Miss { mtime }),
        }
    }

    /// Record a completed extraction, replacing any previous entry wholesale
    pub fn store(&mut self, path: PathBuf, mtime: SystemTime, candidates: Vec<Candidate>) {
        self.files.insert(path, CachedFile { mtime, candidates });
    }

    /// Number of distinct files cached this session
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Cumulative cache hits this session
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// Read a file's modification time from the filesystem
pub fn file_mtime(path: &Path) -> Result<SystemTime, ScanError> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| ScanError::Metadata {
            path: path.to_path_buf(),
            source,
        })
}
