//! Broadcast secret encryption using AES-256-CBC
//!
//! All functions are pure - the IV must be provided by the caller.
//! This enables deterministic testing and pinned test vectors.

use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};

use crate::{
    chain::SecretKey,
    ephid::DailyCiphertext,
    error::CryptoError,
    schedule::Schedule,
};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes. Also the IV and EphID size.
pub const BLOCK_SIZE: usize = 16;

/// Encrypts the broadcast secret under per-identity secret keys.
///
/// Holds the broadcast secret shared by every party. The secret is read once
/// at construction and must be exactly `N × BLOCK_SIZE` bytes for the
/// configured [`Schedule`].
///
/// # Security
///
/// There is no MAC. [`decrypt`](Self::decrypt) treats "plaintext equals the
/// known broadcast secret" as the authenticity check, which is weaker than an
/// authenticated encryption scheme.
#[derive(Clone)]
pub struct BlockCipherCodec {
    schedule: Schedule,
    broadcast_secret: Vec<u8>,
}

impl BlockCipherCodec {
    /// Create a codec for `broadcast_secret`.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if the secret is not `N × BLOCK_SIZE` bytes
    pub fn new(schedule: Schedule, broadcast_secret: Vec<u8>) -> Result<Self, CryptoError> {
        let expected = schedule.broadcast_secret_len();
        if broadcast_secret.len() != expected {
            return Err(CryptoError::SizeMismatch {
                what: "broadcast secret",
                expected,
                actual: broadcast_secret.len(),
            });
        }
        Ok(Self { schedule, broadcast_secret })
    }

    /// Schedule the broadcast secret was sized for.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// The shared broadcast secret.
    pub fn broadcast_secret(&self) -> &[u8] {
        &self.broadcast_secret
    }

    /// Encrypt the broadcast secret, producing the day's ciphertext.
    pub fn encrypt(&self, sk: &SecretKey, iv: &[u8; BLOCK_SIZE]) -> DailyCiphertext {
        let bytes = self.encrypt_with(sk, iv, &self.broadcast_secret);
        DailyCiphertext::from_parts(self.schedule, bytes)
    }

    /// Encrypt an arbitrary plaintext. Returns `iv ‖ ciphertext`.
    ///
    /// The plaintext is padded with trailing zero bytes up to a multiple of
    /// the block size. Aligned plaintexts get no padding. Zero padding is not
    /// reversible for plaintexts that end in a zero byte.
    pub fn encrypt_with(&self, sk: &SecretKey, iv: &[u8; BLOCK_SIZE], plaintext: &[u8]) -> Vec<u8> {
        let padded = pad(plaintext);
        let ciphertext = Aes256CbcEnc::new(sk.as_bytes().into(), iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(&padded);

        let mut out = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        out.extend_from_slice(iv);
        out.extend_from_slice(&ciphertext);
        out
    }

    /// Decrypt `iv ‖ ciphertext` and check it against the broadcast secret.
    ///
    /// Returns the recovered broadcast secret.
    ///
    /// # Errors
    ///
    /// - `InvalidCiphertext`: if the input is malformed or the plaintext is
    ///   not the broadcast secret (wrong key, wrong IV, tampering)
    pub fn decrypt(&self, sk: &SecretKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < BLOCK_SIZE || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidCiphertext);
        }

        let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
        let iv: &[u8; BLOCK_SIZE] = iv.try_into().map_err(|_| CryptoError::InvalidCiphertext)?;

        let plaintext = Aes256CbcDec::new(sk.as_bytes().into(), iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(body)
            .map_err(|_| CryptoError::InvalidCiphertext)?;

        // The secret is block-aligned, so a genuine plaintext carries no padding
        if plaintext != self.broadcast_secret {
            return Err(CryptoError::InvalidCiphertext);
        }

        Ok(plaintext)
    }
}

/// Zero-pad `msg` to a multiple of [`BLOCK_SIZE`].
fn pad(msg: &[u8]) -> Vec<u8> {
    let remainder = msg.len() % BLOCK_SIZE;
    let mut padded = msg.to_vec();
    if remainder != 0 {
        padded.resize(msg.len() + BLOCK_SIZE - remainder, 0);
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chain::SK_SIZE, hash::hash};

    fn test_secret(schedule: Schedule) -> Vec<u8> {
        (0..schedule.broadcast_secret_len()).map(|i| (i % 256) as u8).collect()
    }

    fn test_codec() -> BlockCipherCodec {
        let schedule = Schedule::default();
        BlockCipherCodec::new(schedule, test_secret(schedule)).unwrap()
    }

    fn sk_a() -> SecretKey {
        SecretKey::from_bytes([b'A'; SK_SIZE])
    }

    #[test]
    fn pinned_vector() {
        let codec = test_codec();
        let ciphertext = codec.encrypt(&sk_a(), &[0u8; BLOCK_SIZE]);
        let bytes = ciphertext.as_bytes();

        assert_eq!(bytes.len(), BLOCK_SIZE + 144 * BLOCK_SIZE);
        assert_eq!(&bytes[..BLOCK_SIZE], &[0u8; BLOCK_SIZE]);
        assert_eq!(hex::encode(&bytes[16..32]), "7d778c0e4018891a21a99c1a729f53fa");
        assert_eq!(hex::encode(&bytes[32..48]), "29759e39f07851ea1070791ce2505b01");
        assert_eq!(hex::encode(&bytes[48..64]), "6a77e0ce1187664aa1316b4c9489ed0f");
        assert_eq!(
            hex::encode(&bytes[bytes.len() - BLOCK_SIZE..]),
            "4a9b3b24ef8317418672cd38b233cb55"
        );
        assert_eq!(
            hex::encode(hash(ciphertext.body())),
            "b482a4fa08e989d765d37501cb02a6c7588fa5102a55d5c56b0cdaac79c77298"
        );
    }

    #[test]
    fn short_plaintext_is_zero_padded() {
        let codec = test_codec();
        let out = codec.encrypt_with(&sk_a(), &[0u8; BLOCK_SIZE], b"hello");

        assert_eq!(out.len(), 2 * BLOCK_SIZE);
        assert_eq!(hex::encode(&out[BLOCK_SIZE..]), "5e88200374d06843391292cd2284b01e");

        let explicit = codec.encrypt_with(&sk_a(), &[0u8; BLOCK_SIZE], b"hello\0\0\0\0\0\0\0\0\0\0\0");
        assert_eq!(out, explicit);
    }

    #[test]
    fn aligned_plaintext_is_not_padded() {
        assert_eq!(pad(&[1u8; 32]).len(), 32);
        assert_eq!(pad(&[1u8; 33]).len(), 48);
        assert!(pad(&[]).is_empty());
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let codec = test_codec();
        let iv = [0x5Au8; BLOCK_SIZE];
        let ciphertext = codec.encrypt(&sk_a(), &iv);

        let plaintext = codec.decrypt(&sk_a(), ciphertext.as_bytes()).unwrap();
        assert_eq!(plaintext, codec.broadcast_secret());
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let codec = test_codec();
        let ciphertext = codec.encrypt(&sk_a(), &[0u8; BLOCK_SIZE]);

        let wrong = SecretKey::from_bytes([b'B'; SK_SIZE]);
        assert_eq!(codec.decrypt(&wrong, ciphertext.as_bytes()), Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let codec = test_codec();
        let mut bytes = codec.encrypt(&sk_a(), &[0u8; BLOCK_SIZE]).as_bytes().to_vec();
        bytes[40] ^= 0x01;

        assert_eq!(codec.decrypt(&sk_a(), &bytes), Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn malformed_ciphertext_fails_decryption() {
        let codec = test_codec();
        assert_eq!(codec.decrypt(&sk_a(), &[]), Err(CryptoError::InvalidCiphertext));
        assert_eq!(codec.decrypt(&sk_a(), &[0u8; 17]), Err(CryptoError::InvalidCiphertext));
        assert_eq!(codec.decrypt(&sk_a(), &[0u8; 32]), Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn rejects_wrongly_sized_broadcast_secret() {
        let schedule = Schedule::default();
        let result = BlockCipherCodec::new(schedule, vec![0u8; 100]);
        assert!(matches!(
            result,
            Err(CryptoError::SizeMismatch { what: "broadcast secret", expected: 2304, actual: 100 })
        ));
    }

    #[test]
    fn iv_changes_ciphertext() {
        let codec = test_codec();
        let a = codec.encrypt(&sk_a(), &[0u8; BLOCK_SIZE]);
        let b = codec.encrypt(&sk_a(), &[1u8; BLOCK_SIZE]);
        assert_ne!(a.body(), b.body());
    }
}
