//
// error.rs
//
// Error types for indexing and navigation
//

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read one file during a directory scan.
///
/// Scan errors never abort a walk: the file is logged and skipped, and the
/// rest of the project is still indexed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Go-to-definition could not produce a target.
///
/// Every variant is the same user-facing condition ("not available"); the
/// variants only exist so logs say which step gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("can't jump to definition: no cross-reference on this line")]
    NoReference,
    #[error("can't jump to definition: reference is not closed on this line")]
    Unterminated,
    #[error("can't jump to definition: label '{0}' is not indexed")]
    UnknownLabel(String),
}
