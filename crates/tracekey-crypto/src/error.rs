//! Error types for the cryptographic primitives.

use thiserror::Error;

/// Errors from key-schedule primitives.
///
/// Signature verification failures are not errors: [`crate::verify`]
/// returns `false` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A fixed-width value has the wrong length
    #[error("{what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Which value was malformed
        what: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Ciphertext body does not split into exactly N EphIDs
    #[error("ciphertext does not hold {expected} ephids ({actual} bytes)")]
    InsufficientEphIds {
        /// Required number of EphIDs per day
        expected: usize,
        /// Length of the ciphertext body in bytes
        actual: usize,
    },

    /// Decrypted value is not the broadcast secret (wrong key or tampered)
    #[error("ciphertext not valid")]
    InvalidCiphertext,

    /// EphID window length does not divide a day
    #[error("invalid window: {minutes} minutes does not evenly divide a day")]
    InvalidWindow {
        /// Requested window length in minutes
        minutes: u32,
    },

    /// Minute-of-day outside `0..1440`
    #[error("minute {minute} is outside the day")]
    MinuteOutOfRange {
        /// Requested minute since midnight
        minute: u32,
    },

    /// Bytes do not encode a valid P-256 key
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// What was wrong with the key
        reason: &'static str,
    },
}
