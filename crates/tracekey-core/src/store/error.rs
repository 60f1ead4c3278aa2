use thiserror::Error;

/// Storage backend errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying I/O or database failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// A stored value could not be interpreted by the backend.
    #[error("corrupted storage entry {key}: {reason}")]
    Corrupted {
        /// Key of the damaged entry
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// Key cannot be mapped onto the backend (e.g. not a plain file name).
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}
