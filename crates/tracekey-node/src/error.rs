//! Node error types.

use std::{fmt, path::PathBuf};

use tracekey_core::{Error as CoreError, StorageError};

/// Errors that can occur while running a node command.
#[derive(Debug)]
pub enum NodeError {
    /// Configuration error (bad window length, unusable data directory).
    ///
    /// Fatal. Fix the arguments and rerun.
    Config(String),

    /// A file named on the command line could not be read.
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Key-schedule operation failed.
    ///
    /// Wraps errors from `tracekey-core`. See `tracekey_core::Error` for the
    /// individual kinds; all of them abort the command.
    Core(CoreError),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Core(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<CoreError> for NodeError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<StorageError> for NodeError {
    fn from(err: StorageError) -> Self {
        Self::Core(CoreError::Storage(err))
    }
}
