//! Broadcast packets and the receiver's packet log.
//!
//! Wire format (fixed 96 bytes, no framing):
//!
//! ```text
//! ┌──────────┬──────────┬───────────────────────┐
//! │ IV (16)  │ EphID(16)│ Signature (64)        │
//! └──────────┴──────────┴───────────────────────┘
//! ```
//!
//! The IV lets a receiver recompute a candidate sender's whole day of EphIDs.
//! Senders that are not infected put [`Signature::ZERO`] in the last field.

use tracekey_crypto::{BLOCK_SIZE, EphId, SIGNATURE_SIZE, Signature};

use crate::{
    error::Error,
    store::{Store, append_unique, keys, records},
};

/// Size of one encoded packet.
pub const PACKET_SIZE: usize = BLOCK_SIZE + BLOCK_SIZE + SIGNATURE_SIZE;

/// One broadcast observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// IV of the sender's daily ciphertext
    pub iv: [u8; BLOCK_SIZE],
    /// EphID active when the packet was sent
    pub ephid: EphId,
    /// Signature over the EphID, or the zero sentinel
    pub signature: Signature,
}

impl Packet {
    /// Encode as `IV ‖ EphID ‖ Signature`.
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut bytes = [0u8; PACKET_SIZE];
        bytes[..BLOCK_SIZE].copy_from_slice(&self.iv);
        bytes[BLOCK_SIZE..2 * BLOCK_SIZE].copy_from_slice(self.ephid.as_bytes());
        bytes[2 * BLOCK_SIZE..].copy_from_slice(self.signature.as_bytes());
        bytes
    }

    /// Decode a packet.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not exactly [`PACKET_SIZE`] long
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PACKET_SIZE {
            return Err(Error::SizeMismatch {
                what: "packet",
                expected: PACKET_SIZE,
                actual: bytes.len(),
            });
        }

        let (iv, rest) = bytes.split_at(BLOCK_SIZE);
        let (ephid, signature) = rest.split_at(BLOCK_SIZE);

        let mut iv_bytes = [0u8; BLOCK_SIZE];
        iv_bytes.copy_from_slice(iv);

        Ok(Self {
            iv: iv_bytes,
            ephid: EphId::from_slice(ephid)?,
            signature: Signature::from_slice(signature)?,
        })
    }
}

/// Append-only log of received packets.
#[derive(Debug, Clone)]
pub struct PacketLog<S> {
    store: S,
}

impl<S: Store> PacketLog<S> {
    /// Open the log kept in `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a packet unless an identical one is already logged.
    ///
    /// Returns whether it was appended.
    pub fn record(&self, packet: &Packet) -> Result<bool, Error> {
        append_unique(&self.store, keys::EPHIDS, &packet.to_bytes())
    }

    /// All logged packets in arrival order. An absent log is empty.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if the log is not a whole number of packets
    pub fn read_all(&self) -> Result<Vec<Packet>, Error> {
        let Some(bytes) = self.store.get(keys::EPHIDS)? else {
            return Ok(Vec::new());
        };

        records(keys::EPHIDS, &bytes, PACKET_SIZE)?.map(Packet::from_bytes).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn packet(seed: u8) -> Packet {
        Packet {
            iv: [seed; BLOCK_SIZE],
            ephid: EphId::from_bytes([seed.wrapping_add(1); BLOCK_SIZE]),
            signature: Signature::from_bytes([seed.wrapping_add(2); SIGNATURE_SIZE]),
        }
    }

    #[test]
    fn layout_is_iv_ephid_signature() {
        let bytes = packet(1).to_bytes();

        assert_eq!(bytes.len(), 96);
        assert_eq!(&bytes[..16], &[1u8; 16]);
        assert_eq!(&bytes[16..32], &[2u8; 16]);
        assert_eq!(&bytes[32..], &[3u8; 64]);
        assert_eq!(Packet::from_bytes(&bytes).unwrap(), packet(1));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Packet::from_bytes(&[0u8; 95]),
            Err(Error::SizeMismatch { what: "packet", expected: 96, actual: 95 })
        );
    }

    #[test]
    fn log_suppresses_duplicates_and_keeps_order() {
        let log = PacketLog::new(MemoryStore::new());

        assert!(log.record(&packet(5)).unwrap());
        assert!(log.record(&packet(9)).unwrap());
        assert!(!log.record(&packet(5)).unwrap());

        assert_eq!(log.read_all().unwrap(), vec![packet(5), packet(9)]);
    }

    #[test]
    fn absent_log_is_empty() {
        assert!(PacketLog::new(MemoryStore::new()).read_all().unwrap().is_empty());
    }

    #[test]
    fn truncated_log_is_size_mismatch() {
        let store = MemoryStore::new();
        store.put(keys::EPHIDS, &[0u8; 100]).unwrap();

        assert_eq!(
            PacketLog::new(store).read_all(),
            Err(Error::SizeMismatch { what: "ephids", expected: 96, actual: 100 })
        );
    }
}
