//! Daily secret-key hash chain
//!
//! # Security Properties
//!
//! - One-way: `SK(d + 1) = H(SK(d))`, so a leaked SK does not reveal earlier days
//! - Composable: advancing `a` days then `b` days equals advancing `a + b`
//! - Determinism: same SK and day count always produce the same result

use std::fmt;

use zeroize::Zeroize;

use crate::{error::CryptoError, hash::hash};

/// Size of a secret key in bytes (AES-256 key, SHA-256 digest).
pub const SK_SIZE: usize = 32;

/// A rotating per-identity secret key.
///
/// Used as the AES-256 key that turns the broadcast secret into the day's
/// EphIDs. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; SK_SIZE]);

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; SK_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key read from storage or the wire.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not exactly [`SK_SIZE`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SK_SIZE] = bytes.try_into().map_err(|_| CryptoError::SizeMismatch {
            what: "secret key",
            expected: SK_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SK_SIZE] {
        &self.0
    }

    /// The key for the following day: `H(SK)`.
    pub fn next(&self) -> Self {
        Self(hash(&self.0))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Advance a key by `days` steps of the hash chain.
///
/// Each elapsed day contributes exactly one hash application; `days == 0`
/// returns an unchanged copy.
pub fn advance(sk: &SecretKey, days: u32) -> SecretKey {
    let mut current = sk.clone();
    for _ in 0..days {
        current = current.next();
    }
    current
}
