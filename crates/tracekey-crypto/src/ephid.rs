//! Daily ciphertext and ephemeral identifiers.

use std::fmt;

use crate::{cipher::BLOCK_SIZE, error::CryptoError, schedule::Schedule};

/// An ephemeral identifier: one cipher block of the daily ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EphId([u8; BLOCK_SIZE]);

impl EphId {
    /// Wrap raw EphID bytes.
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse an EphID from the wire.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not exactly one block long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let block: [u8; BLOCK_SIZE] = bytes.try_into().map_err(|_| CryptoError::SizeMismatch {
            what: "ephid",
            expected: BLOCK_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(block))
    }

    /// Raw EphID bytes.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EphId(")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// The broadcast secret encrypted under one day's SK: `IV ‖ C₀ ‖ ... ‖ Cₙ₋₁`.
///
/// # Invariants
///
/// - Length is always `BLOCK_SIZE + N × BLOCK_SIZE` for its schedule
/// - The N ciphertext blocks partition the body exactly, one EphID each
#[derive(Clone, PartialEq, Eq)]
pub struct DailyCiphertext {
    schedule: Schedule,
    bytes: Vec<u8>,
}

impl DailyCiphertext {
    /// Wrap codec output that is already the right length.
    pub(crate) fn from_parts(schedule: Schedule, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), schedule.daily_ciphertext_len());
        Self { schedule, bytes }
    }

    /// Parse a persisted daily ciphertext.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if the length is not `BLOCK_SIZE + N × BLOCK_SIZE`
    pub fn from_bytes(schedule: Schedule, bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let expected = schedule.daily_ciphertext_len();
        if bytes.len() != expected {
            return Err(CryptoError::SizeMismatch {
                what: "daily ciphertext",
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self { schedule, bytes })
    }

    /// The IV the ciphertext was produced with.
    pub fn iv(&self) -> [u8; BLOCK_SIZE] {
        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(&self.bytes[..BLOCK_SIZE]);
        iv
    }

    /// Ciphertext without the IV.
    pub fn body(&self) -> &[u8] {
        &self.bytes[BLOCK_SIZE..]
    }

    /// Full `IV ‖ ciphertext` encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// All N EphIDs of the day, in window order.
    ///
    /// # Errors
    ///
    /// - `InsufficientEphIds`: if the body does not split into N blocks
    pub fn all_ephids(&self) -> Result<Vec<EphId>, CryptoError> {
        split_ephids(self.body(), self.schedule.ephids_per_day())
    }

    /// The EphID active at `minute` since midnight.
    ///
    /// # Errors
    ///
    /// - `MinuteOutOfRange`: if `minute` is not within the day
    /// - `InsufficientEphIds`: if the body does not split into N blocks
    pub fn active_ephid(&self, minute: u32) -> Result<EphId, CryptoError> {
        let index = self.schedule.index_at(minute)?;
        let ephids = self.all_ephids()?;
        ephids.get(index).copied().ok_or(CryptoError::InsufficientEphIds {
            expected: self.schedule.ephids_per_day(),
            actual: self.body().len(),
        })
    }
}

impl fmt::Debug for DailyCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DailyCiphertext")
            .field("schedule", &self.schedule)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Split a ciphertext body into exactly `count` contiguous EphIDs.
///
/// # Errors
///
/// - `InsufficientEphIds`: if the body is not exactly `count` blocks long
pub fn split_ephids(body: &[u8], count: usize) -> Result<Vec<EphId>, CryptoError> {
    if count == 0 || body.len() != count * BLOCK_SIZE {
        return Err(CryptoError::InsufficientEphIds { expected: count, actual: body.len() });
    }

    body.chunks_exact(BLOCK_SIZE).map(EphId::from_slice).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::{SK_SIZE, SecretKey},
        cipher::BlockCipherCodec,
    };

    fn test_ciphertext() -> DailyCiphertext {
        let schedule = Schedule::default();
        let secret = (0..schedule.broadcast_secret_len()).map(|i| (i % 256) as u8).collect();
        let codec = BlockCipherCodec::new(schedule, secret).unwrap();
        codec.encrypt(&SecretKey::from_bytes([b'A'; SK_SIZE]), &[0u8; BLOCK_SIZE])
    }

    #[test]
    fn all_ephids_partition_the_body() {
        let ciphertext = test_ciphertext();
        let ephids = ciphertext.all_ephids().unwrap();

        assert_eq!(ephids.len(), 144);
        let joined: Vec<u8> = ephids.iter().flat_map(|e| e.as_bytes().to_vec()).collect();
        assert_eq!(joined, ciphertext.body());
    }

    #[test]
    fn active_ephid_at_minute_25_is_block_2() {
        let ciphertext = test_ciphertext();
        let ephid = ciphertext.active_ephid(25).unwrap();

        assert_eq!(hex::encode(ephid.as_bytes()), "6a77e0ce1187664aa1316b4c9489ed0f");
        assert_eq!(ephid, ciphertext.all_ephids().unwrap()[2]);
    }

    #[test]
    fn active_ephid_first_and_last_window() {
        let ciphertext = test_ciphertext();
        let ephids = ciphertext.all_ephids().unwrap();

        assert_eq!(ciphertext.active_ephid(0).unwrap(), ephids[0]);
        assert_eq!(ciphertext.active_ephid(1439).unwrap(), ephids[143]);
        assert_eq!(
            ciphertext.active_ephid(1440),
            Err(CryptoError::MinuteOutOfRange { minute: 1440 })
        );
    }

    #[test]
    fn split_rejects_wrong_block_count() {
        assert_eq!(
            split_ephids(&[0u8; 47], 3),
            Err(CryptoError::InsufficientEphIds { expected: 3, actual: 47 })
        );
        assert_eq!(
            split_ephids(&[0u8; 64], 3),
            Err(CryptoError::InsufficientEphIds { expected: 3, actual: 64 })
        );
        assert!(split_ephids(&[], 0).is_err());
        assert_eq!(split_ephids(&[0u8; 48], 3).unwrap().len(), 3);
    }

    #[test]
    fn from_bytes_validates_length() {
        let schedule = Schedule::default();
        let result = DailyCiphertext::from_bytes(schedule, vec![0u8; 100]);
        assert!(matches!(
            result,
            Err(CryptoError::SizeMismatch { what: "daily ciphertext", expected: 2320, actual: 100 })
        ));

        let bytes = test_ciphertext().as_bytes().to_vec();
        let parsed = DailyCiphertext::from_bytes(schedule, bytes).unwrap();
        assert_eq!(parsed, test_ciphertext());
        assert_eq!(parsed.iv(), [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn ephid_from_slice_validates_length() {
        assert!(EphId::from_slice(&[0u8; 15]).is_err());
        assert_eq!(EphId::from_slice(&[7u8; 16]).unwrap(), EphId::from_bytes([7u8; 16]));
    }
}
