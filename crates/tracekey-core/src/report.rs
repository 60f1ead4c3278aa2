//! Reports of confirmed contacts, and the server's verdict on them.
//!
//! A receiver that matched a packet sends the matching identity's public key
//! together with the packet's EphID and signature:
//!
//! ```text
//! ┌──────────────────┬──────────┬───────────────────────┐
//! │ Public key (64)  │ EphID(16)│ Signature (64)        │
//! └──────────────────┴──────────┴───────────────────────┘
//! ```
//!
//! The server only checks the signature; it cannot tell whether the
//! reporter actually met the sender, only that the EphID was signed by the
//! listed key.

use tracekey_crypto::{
    BLOCK_SIZE, EphId, PUBLIC_KEY_SIZE, PublicKey, SIGNATURE_SIZE, Signature, verify,
};
use tracing::{debug, warn};

use crate::{error::Error, matcher::PacketMatch, packet::Packet};

/// Size of one encoded report.
pub const REPORT_SIZE: usize = PUBLIC_KEY_SIZE + BLOCK_SIZE + SIGNATURE_SIZE;

/// A contact report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Public key of the infected identity that was met
    pub public_key: PublicKey,
    /// EphID that identity broadcast
    pub ephid: EphId,
    /// The packet's signature over the EphID
    pub signature: Signature,
}

impl Report {
    /// Encode as `publicKey ‖ EphID ‖ Signature`.
    pub fn to_bytes(&self) -> [u8; REPORT_SIZE] {
        let mut bytes = [0u8; REPORT_SIZE];
        bytes[..PUBLIC_KEY_SIZE].copy_from_slice(&self.public_key.to_bytes());
        bytes[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + BLOCK_SIZE].copy_from_slice(self.ephid.as_bytes());
        bytes[PUBLIC_KEY_SIZE + BLOCK_SIZE..].copy_from_slice(self.signature.as_bytes());
        bytes
    }

    /// Decode a report.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if `bytes` is not exactly [`REPORT_SIZE`] long
    /// - `InvalidKey`: if the public key is not on P-256
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != REPORT_SIZE {
            return Err(Error::SizeMismatch {
                what: "report",
                expected: REPORT_SIZE,
                actual: bytes.len(),
            });
        }

        let (public_key, rest) = bytes.split_at(PUBLIC_KEY_SIZE);
        let (ephid, signature) = rest.split_at(BLOCK_SIZE);

        Ok(Self {
            public_key: PublicKey::from_bytes(public_key)?,
            ephid: EphId::from_slice(ephid)?,
            signature: Signature::from_slice(signature)?,
        })
    }

    /// Whether the signature over the EphID verifies under the public key.
    pub fn verify(&self) -> bool {
        verify(&self.public_key, self.ephid.as_bytes(), self.signature.as_bytes())
    }
}

/// Delivers a report to the server and returns its response.
pub trait ReportTransport {
    /// Send one encoded report.
    fn send(&mut self, message: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Server verdict on a report message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerdict {
    /// Message could not be decoded
    Malformed,
    /// Signature verifies: the EphID came from the listed infected identity
    Confirmed,
    /// Signature does not verify
    Forged,
}

impl ReportVerdict {
    /// Judge a raw report message.
    pub fn evaluate(message: &[u8]) -> Self {
        match Report::from_bytes(message) {
            Err(err) => {
                debug!(%err, "rejecting malformed report");
                Self::Malformed
            },
            Ok(report) if report.verify() => Self::Confirmed,
            Ok(report) => {
                warn!(public_key = ?report.public_key, "report signature does not verify");
                Self::Forged
            },
        }
    }

    /// Fixed response text returned to the reporter.
    pub fn response(self) -> &'static [u8] {
        match self {
            Self::Malformed => b"The message is not valid.",
            Self::Confirmed => b"Thanks for your help :) the subject has violated the quarantine!",
            Self::Forged => b"Thanks for your help :( but you are trying to scam the system...",
        }
    }

    /// Recover a verdict from its response text.
    pub fn from_response(response: &[u8]) -> Option<Self> {
        [Self::Malformed, Self::Confirmed, Self::Forged]
            .into_iter()
            .find(|verdict| verdict.response() == response)
    }
}

/// Send a report for every matched packet.
///
/// `matches` and `packets` are parallel, as returned by
/// [`match_packets`](crate::match_packets). With `tamper` set the last
/// signature byte is corrupted before sending, simulating an adversarial
/// receiver that forges reports. Returns the server responses in order.
pub fn report_matches<T: ReportTransport>(
    matches: &[PacketMatch],
    packets: &[Packet],
    transport: &mut T,
    tamper: bool,
) -> Result<Vec<Vec<u8>>, Error> {
    let mut responses = Vec::new();

    for (result, packet) in matches.iter().zip(packets) {
        let Some(public_key) = result.public_key.as_ref().filter(|_| result.matched) else {
            continue;
        };

        let mut signature = *packet.signature.as_bytes();
        if tamper {
            signature[SIGNATURE_SIZE - 1] ^= 0xFF;
        }

        let report = Report {
            public_key: public_key.clone(),
            ephid: packet.ephid,
            signature: Signature::from_bytes(signature),
        };
        responses.push(transport.send(&report.to_bytes())?);
    }

    Ok(responses)
}
