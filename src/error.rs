//! Error and warning types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Hard failures surfaced to callers.
#[derive(Error, Debug)]
pub enum LogError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configured root cannot hold log directories
    #[error("invalid log root {0}: not a directory")]
    InvalidRoot(PathBuf),

    /// The flush thread could not be started
    #[error("failed to spawn flush thread: {0}")]
    Spawn(#[source] io::Error),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a ten-line record block could not be turned into a row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected label [{expected}] on field line {index}")]
    WrongLabel { expected: &'static str, index: usize },

    #[error("field line {index} has no `]:` delimiter")]
    MissingDelimiter { index: usize },

    #[error("record is not terminated by a separator line")]
    MissingSeparator,

    #[error("bad timestamp {0:?}")]
    BadTimestamp(String),

    #[error("bad integer {0:?}")]
    BadInteger(String),

    #[error("bad level {0:?}")]
    BadSeverity(String),
}

/// Non-fatal problems found while answering a query.
///
/// The affected file or record is skipped and the rest of the result is
/// still returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryWarning {
    /// A `*.log` file whose stem is not a `yyyy-MM-dd` date
    UnparseableFileName { path: PathBuf },

    /// A file that could not be opened or was not valid UTF-8
    UnreadableFile { path: PathBuf, reason: String },

    /// A record block starting at `line` (1-based) that did not parse
    MalformedRecord {
        path: PathBuf,
        line: usize,
        error: FormatError,
    },

    /// Trailing lines that do not form a complete record
    TruncatedTail { path: PathBuf, lines: usize },
}

impl std::fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryWarning::UnparseableFileName { path } => {
                write!(f, "{}: file name is not a date", path.display())
            }
            QueryWarning::UnreadableFile { path, reason } => {
                write!(f, "{}: unreadable: {}", path.display(), reason)
            }
            QueryWarning::MalformedRecord { path, line, error } => {
                write!(f, "{}:{}: malformed record: {}", path.display(), line, error)
            }
            QueryWarning::TruncatedTail { path, lines } => {
                write!(f, "{}: ignored {} trailing line(s)", path.display(), lines)
            }
        }
    }
}
