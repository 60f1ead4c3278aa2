//! P-256 identity key pairs for infected identities.
//!
//! An infected identity's initial SK is bound to its public point:
//! `SK = H(x ‖ y)`, with `x` and `y` as 32-byte big-endian coordinates. Any
//! party holding only the public key recomputes the same SK with
//! [`derive_sk`], without the private key ever leaving the identity.

use std::fmt;

use p256::ecdsa::{SigningKey, VerifyingKey};

use crate::{
    chain::SecretKey,
    error::CryptoError,
    hash::hash_concat,
    signature::{self, Signature},
};

/// Size of one affine coordinate in bytes.
pub const COORDINATE_SIZE: usize = 32;

/// Size of an exported public key (`x ‖ y`) in bytes.
pub const PUBLIC_KEY_SIZE: usize = 2 * COORDINATE_SIZE;

/// Size of a persisted private scalar in bytes.
const PRIVATE_KEY_SIZE: usize = 32;

/// SEC1 tag for an uncompressed point.
const SEC1_UNCOMPRESSED: u8 = 0x04;

/// A P-256 public point together with its `x ‖ y` encoding.
#[derive(Clone)]
pub struct PublicKey {
    key: VerifyingKey,
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Reconstruct a public point from its `x ‖ y` encoding.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `xy` is not [`PUBLIC_KEY_SIZE`] bytes
    /// - `InvalidKey`: if the coordinates are not a point on P-256
    pub fn from_bytes(xy: &[u8]) -> Result<Self, CryptoError> {
        if xy.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::SizeMismatch {
                what: "public key",
                expected: PUBLIC_KEY_SIZE,
                actual: xy.len(),
            });
        }

        let mut sec1 = [0u8; PUBLIC_KEY_SIZE + 1];
        sec1[0] = SEC1_UNCOMPRESSED;
        sec1[1..].copy_from_slice(xy);

        let key = VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|_| CryptoError::InvalidKey { reason: "not a point on P-256" })?;

        Ok(Self::from_verifying_key(key))
    }

    fn from_verifying_key(key: VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        // Uncompressed SEC1: tag byte, then x, then y
        bytes.copy_from_slice(&point.as_bytes()[1..]);
        Self { key, bytes }
    }

    /// The `x ‖ y` encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.bytes
    }

    /// Big-endian x coordinate.
    pub fn x(&self) -> &[u8] {
        &self.bytes[..COORDINATE_SIZE]
    }

    /// Big-endian y coordinate.
    pub fn y(&self) -> &[u8] {
        &self.bytes[COORDINATE_SIZE..]
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in &self.bytes[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// The SK an infected identity starts from: `H(x ‖ y)`.
pub fn derive_sk(public_key: &PublicKey) -> SecretKey {
    SecretKey::from_bytes(hash_concat(&[public_key.x(), public_key.y()]))
}

/// Private/public key pair of an infected identity.
#[derive(Clone)]
pub struct IdentityKeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl IdentityKeyPair {
    /// Build a fresh key pair from 32 random bytes.
    ///
    /// Deterministic in `seed`. Callers retry with new randomness on
    /// `InvalidKey` (probability about 2⁻³²).
    ///
    /// # Errors
    ///
    /// - `InvalidKey`: if the seed is zero or not below the group order
    pub fn from_seed(seed: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self, CryptoError> {
        Self::from_private_bytes(seed)
    }

    /// Load a key pair from its 32-byte private scalar.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not 32 bytes
    /// - `InvalidKey`: if the scalar is zero or not below the group order
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let scalar: &[u8; PRIVATE_KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::SizeMismatch {
                what: "private key",
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            })?;

        let signing_key = SigningKey::from_bytes(scalar.into())
            .map_err(|_| CryptoError::InvalidKey { reason: "scalar out of range" })?;
        let public_key = PublicKey::from_verifying_key(signing_key.verifying_key().clone());

        Ok(Self { signing_key, public_key })
    }

    /// The 32-byte private scalar, for persistence.
    pub fn private_key_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        bytes.copy_from_slice(&self.signing_key.to_bytes());
        bytes
    }

    /// The public point.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The public key as `x ‖ y`.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.to_bytes()
    }

    /// The initial SK bound to this key pair.
    pub fn initial_sk(&self) -> SecretKey {
        derive_sk(&self.public_key)
    }

    /// Sign `msg` (deterministic ECDSA).
    pub fn sign(&self, msg: &[u8]) -> Signature {
        signature::sign(self, msg)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKeyPair").field("public_key", &self.public_key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEVENS_PUBLIC_KEY: &str = "1e18532fd4754c02f3041d9c75ceb33b83ffd81ac7ce4fe882ccb1c98bc5896e\
                                     a46c311c4e2ff40dd96a3653e6e45445d32dfe486eced75c7a90c6a18881c0a3";

    #[test]
    fn public_key_matches_reference_point() {
        let key_pair = IdentityKeyPair::from_private_bytes(&[7u8; 32]).unwrap();
        assert_eq!(hex::encode(key_pair.public_key_bytes()), SEVENS_PUBLIC_KEY);
    }

    #[test]
    fn sk_is_hash_of_coordinates() {
        let key_pair = IdentityKeyPair::from_private_bytes(&[7u8; 32]).unwrap();
        assert_eq!(
            hex::encode(key_pair.initial_sk().as_bytes()),
            "8c2d7ff63ccb2aa413753256c271421e4f41a512526298427577364cb73adb55"
        );
    }

    #[test]
    fn sk_agrees_from_public_key_only() {
        let key_pair = IdentityKeyPair::from_private_bytes(&[0x11u8; 32]).unwrap();
        let public_only = PublicKey::from_bytes(&key_pair.public_key_bytes()).unwrap();

        assert_eq!(derive_sk(&public_only), key_pair.initial_sk());
        assert_eq!(&public_only, key_pair.public_key());
    }

    #[test]
    fn seed_is_the_private_scalar() {
        let key_pair = IdentityKeyPair::from_seed(&[7u8; 32]).unwrap();
        assert_eq!(hex::encode(key_pair.public_key_bytes()), SEVENS_PUBLIC_KEY);
        assert!(IdentityKeyPair::from_seed(&[0u8; 32]).is_err());
    }

    #[test]
    fn private_key_roundtrip() {
        let key_pair = IdentityKeyPair::from_private_bytes(&[0x22u8; 32]).unwrap();
        let restored = IdentityKeyPair::from_private_bytes(&key_pair.private_key_bytes()).unwrap();

        assert_eq!(restored.public_key(), key_pair.public_key());
        assert_eq!(restored.private_key_bytes(), [0x22u8; 32]);
    }

    #[test]
    fn rejects_invalid_scalars() {
        assert!(matches!(
            IdentityKeyPair::from_private_bytes(&[0u8; 32]),
            Err(CryptoError::InvalidKey { .. })
        ));
        assert!(matches!(
            IdentityKeyPair::from_private_bytes(&[0xFFu8; 32]),
            Err(CryptoError::InvalidKey { .. })
        ));
        assert!(matches!(
            IdentityKeyPair::from_private_bytes(&[1u8; 31]),
            Err(CryptoError::SizeMismatch { what: "private key", .. })
        ));
    }

    #[test]
    fn rejects_points_off_the_curve() {
        let mut bytes = hex::decode(SEVENS_PUBLIC_KEY).unwrap();
        bytes[63] ^= 0x01;

        assert!(matches!(PublicKey::from_bytes(&bytes), Err(CryptoError::InvalidKey { .. })));
        assert!(matches!(
            PublicKey::from_bytes(&[0u8; 10]),
            Err(CryptoError::SizeMismatch { what: "public key", expected: 64, actual: 10 })
        ));
    }

    #[test]
    fn coordinates_split_the_encoding() {
        let key_pair = IdentityKeyPair::from_private_bytes(&[7u8; 32]).unwrap();
        let public_key = key_pair.public_key();

        assert_eq!([public_key.x(), public_key.y()].concat(), public_key.to_bytes());
        assert_eq!(public_key.x().len(), COORDINATE_SIZE);
    }
}
