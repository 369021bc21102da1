use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `nestarc` crate.
///
/// Variants follow the fault taxonomy used throughout the command handlers:
/// validation faults (bad patterns, unmatched patterns, unsupported leaf
/// kinds), resolution faults, per-entry faults, and persistence faults.
/// Invariant violations are not represented here; those panic.
#[derive(Debug, Error)]
pub enum NestArcError {
    /// An I/O error, with the path where it happened when one is known.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A glob pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A supplied pattern matched no entries (strict-match validation).
    #[error("no entries match pattern '{0}'")]
    NoMatch(String),

    /// The extended archive path could not be resolved to a container chain.
    #[error("cannot resolve '{spec}': {reason}")]
    Resolve { spec: String, reason: String },

    /// The resolved leaf does not support the requested operation.
    #[error("{0}")]
    Unsupported(String),

    /// An error from the `zip` crate while reading or rewriting an archive.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A named record was not found in the archive catalog.
    #[error("record '{0}' not found in archive")]
    RecordNotFound(String),

    /// A per-entry operation failed; carries the entry's path.
    #[error("operation failed on entry '{path}': {source}")]
    Entry {
        path: String,
        #[source]
        source: Box<NestArcError>,
    },

    /// The post-mutation save step failed.
    #[error("failed to save updates: {0}")]
    Persist(#[source] Box<NestArcError>),
}

impl NestArcError {
    /// Wraps an error with the entry path it occurred on.
    pub fn on_entry(path: &str, source: NestArcError) -> Self {
        NestArcError::Entry {
            path: path.to_string(),
            source: Box::new(source),
        }
    }

    /// Attaches a path to a raw I/O error.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        NestArcError::Io {
            source,
            path: path.into(),
        }
    }
}

// Generic IO error conversion that doesn't require a path
impl From<std::io::Error> for NestArcError {
    fn from(err: std::io::Error) -> Self {
        NestArcError::Io {
            source: err,
            path: PathBuf::new(),
        }
    }
}
