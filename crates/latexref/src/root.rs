//
// root.rs
//
// Project root discovery for a LaTeX document
//

use std::path::{Path, PathBuf};

/// The directory that bounds recursive file discovery for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    /// Root directory, or the document itself when no marker was found
    pub path: PathBuf,
    /// False when resolution reached the filesystem boundary without a marker
    pub found: bool,
}

impl ProjectRoot {
    /// Directory to walk and whether to descend into subdirectories.
    ///
    /// A fallback root points at the document file, so only the files next to
    /// it are in scope.
    pub fn scan_scope(&self) -> (PathBuf, bool) {
        if self.found {
            return (self.path.clone(), true);
        }
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (dir, false)
    }
}

/// Find the project root for `document`.
///
/// Walks upward from the directory containing `document` and stops at the
/// first directory holding an entry whose name ends with `marker_suffix`.
/// When the filesystem root is reached without a match, the document's own
/// path becomes the root and a warning is logged; this never fails.
pub fn resolve_root(document: &Path, marker_suffix: &str) -> ProjectRoot {
    let mut current = match document.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    loop {
        if dir_has_marker(&current, marker_suffix) {
            log::info!("Project root found at {}", current.display());
            return ProjectRoot {
                path: current,
                found: true,
            };
        }

        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && parent != current => {
                current = parent.to_path_buf();
            }
            _ => break,
        }
    }

    log::warn!(
        "Project root not found for {} (no *{} on any ancestor); indexing next to the document only",
        document.display(),
        marker_suffix
    );
    ProjectRoot {
        path: document.to_path_buf(),
        found: false,
    }
}

fn dir_has_marker(dir: &Path, marker_suffix: &str) -> bool {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot list {}: {}", dir.display(), e);
            return false;
        }
    };
    entries
        .flatten()
        .any(|entry| entry.file_name().to_string_lossy().ends_with(marker_suffix))
}
