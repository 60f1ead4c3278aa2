//! Deterministic ECDSA (RFC 6979) over SHA-256 on P-256.
//!
//! Signing uses no external randomness: the nonce is derived from the private
//! key and the message, so the same key and EphID always yield the same tag.

use std::fmt;

use p256::ecdsa::signature::{Signer, Verifier};

use crate::{
    error::CryptoError,
    identity::{IdentityKeyPair, PublicKey},
};

/// Signature size in bytes (`r ‖ s`).
pub const SIGNATURE_SIZE: usize = 64;

/// A fixed-width `r ‖ s` signature tag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// All-zero sentinel sent by senders that are not infected.
    pub const ZERO: Self = Self([0u8; SIGNATURE_SIZE]);

    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a signature from the wire.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not exactly [`SIGNATURE_SIZE`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let tag: [u8; SIGNATURE_SIZE] = bytes.try_into().map_err(|_| CryptoError::SizeMismatch {
            what: "signature",
            expected: SIGNATURE_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(tag))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Whether this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; SIGNATURE_SIZE]
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("Signature(zero)");
        }
        write!(f, "Signature(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Sign `msg` with the identity's private key.
pub fn sign(key_pair: &IdentityKeyPair, msg: &[u8]) -> Signature {
    let signature: p256::ecdsa::Signature = key_pair.signing_key().sign(msg);

    let mut tag = [0u8; SIGNATURE_SIZE];
    tag.copy_from_slice(&signature.to_bytes());
    Signature(tag)
}

/// Check `tag` over `msg` against `public_key`.
///
/// Returns `false` for any malformed, truncated, or mismatched tag. Never
/// errors: an invalid signature and a failed verification are the same
/// outcome.
pub fn verify(public_key: &PublicKey, msg: &[u8], tag: &[u8]) -> bool {
    let Ok(signature) = p256::ecdsa::Signature::from_slice(tag) else {
        return false;
    };
    public_key.verifying_key().verify(msg, &signature).is_ok()
}
