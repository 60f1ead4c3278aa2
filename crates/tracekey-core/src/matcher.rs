//! Brute-force contact matching.
//!
//! For every infected identity and every received packet the receiver
//! re-encrypts the broadcast secret under the identity's SK and the packet's
//! IV, and checks whether the packet's EphID is one of the resulting N
//! blocks. Cost is O(identities × packets) block-cipher passes.

use tracekey_crypto::{PublicKey, verify};
use tracing::{info, warn};

use crate::{error::Error, packet::Packet, roster::InfectedEntry, scheduler::EphemeralIdScheduler};

/// Outcome for one received packet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketMatch {
    /// The EphID was produced by an infected identity's SK
    pub matched: bool,
    /// Signature check against that identity's key; `Some` only when matched
    pub signature_valid: Option<bool>,
    /// The matching identity's public key
    pub public_key: Option<PublicKey>,
}

impl PacketMatch {
    /// A packet no infected identity produced.
    pub fn unmatched() -> Self {
        Self::default()
    }

    /// Matched with a valid signature.
    pub fn is_confirmed(&self) -> bool {
        self.signature_valid == Some(true)
    }
}

/// Match received packets against the infected roster.
///
/// Returns one result per packet, in input order; an empty roster yields an
/// empty result. When several identities match one packet the first in
/// roster order wins.
pub fn match_packets(
    scheduler: &EphemeralIdScheduler,
    entries: &[InfectedEntry],
    packets: &[Packet],
) -> Result<Vec<PacketMatch>, Error> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = vec![PacketMatch::unmatched(); packets.len()];
    for entry in entries {
        for (packet, result) in packets.iter().zip(results.iter_mut()) {
            if result.matched {
                continue;
            }

            let ephids = scheduler.ephids_for(&entry.sk, &packet.iv)?;
            if !ephids.contains(&packet.ephid) {
                continue;
            }

            let valid = verify(&entry.public_key, packet.ephid.as_bytes(), packet.signature.as_bytes());
            if valid {
                info!(ephid = ?packet.ephid, public_key = ?entry.public_key, "contact with infected identity");
            } else {
                warn!(ephid = ?packet.ephid, public_key = ?entry.public_key, "matched EphID with invalid signature");
            }

            *result = PacketMatch {
                matched: true,
                signature_valid: Some(valid),
                public_key: Some(entry.public_key.clone()),
            };
        }
    }

    Ok(results)
}
