//
// scan.rs
//
// Filesystem walking and file reading shared by the indexers
//

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScanError;

/// What part of the tree an indexing pass covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanScope {
    pub dir: PathBuf,
    pub recursive: bool,
    pub follow_links: bool,
}

impl ScanScope {
    /// Whether a walk of this scope would reach `path`
    pub fn contains(&self, path: &Path) -> bool {
        if self.recursive {
            path.starts_with(&self.dir)
        } else {
            path.parent() == Some(self.dir.as_path())
        }
    }
}

/// Collect files under `scope` whose names satisfy `matches`.
///
/// Entries are visited in file-name order so repeated passes see files in the
/// same sequence. Unreadable directories are logged and skipped.
pub fn matching_files(scope: &ScanScope, matches: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(&scope.dir)
        .follow_links(scope.follow_links)
        .sort_by_file_name();
    if !scope.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", scope.dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Read a file as UTF-8 text.
///
/// Invalid byte sequences are replaced rather than rejected so one stray
/// Latin-1 character does not hide every entry in the file.
pub fn read_text(path: &Path) -> Result<String, ScanError> {
    let bytes = std::fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("{} is not valid UTF-8; decoding lossily", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
