//! Error types for key-schedule operations.

use thiserror::Error;
use tracekey_crypto::CryptoError;

use crate::store::StorageError;

/// Errors surfaced by key-schedule, roster and matching operations.
///
/// Every variant is fatal to the enclosing operation. The only recovered
/// condition (an absent infected roster) never reaches this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A persisted or received value has the wrong byte length.
    #[error("{what} has wrong size: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// What was being read
        what: &'static str,
        /// Expected length (or record width for record lists)
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A ciphertext body does not split into the configured EphID count.
    #[error("ciphertext body of {actual} bytes does not hold {expected} EphIDs")]
    InsufficientEphIds {
        /// EphIDs per day
        expected: usize,
        /// Body length in bytes
        actual: usize,
    },

    /// Decryption failed or did not reproduce the broadcast secret.
    #[error("ciphertext does not decrypt to the broadcast secret")]
    InvalidCiphertext,

    /// The infected public-key and SK lists hold different record counts.
    #[error("infected roster mismatch: {public_keys} public keys, {secret_keys} SKs")]
    RosterMismatch {
        /// Number of public keys listed
        public_keys: usize,
        /// Number of SKs listed
        secret_keys: usize,
    },

    /// State that must already exist is absent.
    #[error("missing required state: {key}")]
    MissingRequiredState {
        /// Store key that was expected
        key: &'static str,
    },

    /// Persisted state is present but unusable.
    #[error("corrupt state in {key}: {reason}")]
    CorruptState {
        /// Store key holding the bad value
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// EphID window length does not divide the day.
    #[error("EphID window of {minutes} minutes does not divide a day")]
    InvalidWindow {
        /// Configured window
        minutes: u32,
    },

    /// Minute-of-day outside `[0, 1440)`.
    #[error("minute {minute} is outside the day")]
    MinuteOutOfRange {
        /// Offending minute
        minute: u32,
    },

    /// Key material rejected by the curve arithmetic.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: &'static str,
    },

    /// The report transport failed to deliver a message.
    #[error("transport error: {0}")]
    Transport(String),

    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SizeMismatch { what, expected, actual } => {
                Self::SizeMismatch { what, expected, actual }
            },
            CryptoError::InsufficientEphIds { expected, actual } => {
                Self::InsufficientEphIds { expected, actual }
            },
            CryptoError::InvalidCiphertext => Self::InvalidCiphertext,
            CryptoError::InvalidWindow { minutes } => Self::InvalidWindow { minutes },
            CryptoError::MinuteOutOfRange { minute } => Self::MinuteOutOfRange { minute },
            CryptoError::InvalidKey { reason } => Self::InvalidKey { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_errors_keep_their_kind() {
        let err: Error = CryptoError::SizeMismatch { what: "ephid", expected: 16, actual: 3 }.into();
        assert_eq!(err, Error::SizeMismatch { what: "ephid", expected: 16, actual: 3 });

        let err: Error = CryptoError::InvalidCiphertext.into();
        assert_eq!(err, Error::InvalidCiphertext);

        let err: Error = CryptoError::MinuteOutOfRange { minute: 1500 }.into();
        assert_eq!(err.to_string(), "minute 1500 is outside the day");
    }

    #[test]
    fn storage_errors_are_transparent() {
        let err: Error = StorageError::Io("disk full".to_string()).into();
        assert_eq!(err.to_string(), "storage I/O error: disk full");
    }
}
