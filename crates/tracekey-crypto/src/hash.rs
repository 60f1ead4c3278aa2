//! One-shot SHA-256, the building block of the key chain.

use sha2::{Digest, Sha256};

/// Digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

/// SHA-256 digest of `msg`.
///
/// Every call starts from a fresh hasher. To hash a concatenation use
/// [`hash_concat`]; `hash(a) ‖ hash(b)` is a different value.
pub fn hash(msg: &[u8]) -> [u8; DIGEST_SIZE] {
    Sha256::digest(msg).into()
}

/// SHA-256 digest of `parts[0] ‖ parts[1] ‖ ...`, hashed as one input.
pub fn hash_concat(parts: &[&[u8]]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
