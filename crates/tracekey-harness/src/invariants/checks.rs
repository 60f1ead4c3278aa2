//! Standard invariant checks.
//!
//! Each check states a property of the persisted state, not a scenario.

use std::collections::HashSet;

use tracekey_core::PACKET_SIZE;
use tracekey_crypto::{
    BlockCipherCodec, PUBLIC_KEY_SIZE, SK_SIZE, SecretKey, advance, derive_sk,
};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

fn elapsed(from: chrono::NaiveDate, to: chrono::NaiveDate) -> u32 {
    u32::try_from((to - from).num_days().max(0)).unwrap_or(u32::MAX)
}

/// The roster's public-key and SK lists hold whole records, equally many.
///
/// Drift between the two lists would pair SKs with the wrong public keys.
pub struct RosterAlignment;

impl Invariant for RosterAlignment {
    fn name(&self) -> &'static str {
        "RosterAlignment"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let (keys, sks) = (state.roster_public_keys.len(), state.roster_sks.len());
        if keys % PUBLIC_KEY_SIZE != 0 || sks % SK_SIZE != 0 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("ragged roster: {keys} public-key bytes, {sks} SK bytes"),
            });
        }
        if keys / PUBLIC_KEY_SIZE != sks / SK_SIZE {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} public keys but {} SKs",
                    keys / PUBLIC_KEY_SIZE,
                    sks / SK_SIZE
                ),
            });
        }
        Ok(())
    }
}

/// A roster SK and its sender's SK lie on the same hash chain.
///
/// Brought to the later of the two dates, they must be equal. Otherwise the
/// receiver recomputes EphIDs the sender never broadcast.
pub struct RosterTracksSenders;

impl Invariant for RosterTracksSenders {
    fn name(&self) -> &'static str {
        "RosterTracksSenders"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(roster_date) = state.roster_updated else {
            return Ok(());
        };

        let entries = state
            .roster_public_keys
            .chunks_exact(PUBLIC_KEY_SIZE)
            .zip(state.roster_sks.chunks_exact(SK_SIZE));
        for (public_key, roster_sk) in entries {
            let sender = state.senders.iter().find(|sender| {
                sender.public_key.as_ref().is_some_and(|pk| pk.to_bytes().as_slice() == public_key)
            });
            let Some(sender) = sender else {
                continue;
            };
            let (Some(sender_sk), Some(sender_date)) = (&sender.sk, sender.last_sk_update) else {
                continue;
            };

            let (Ok(roster_sk), Ok(sender_sk)) =
                (SecretKey::from_slice(roster_sk), SecretKey::from_slice(sender_sk))
            else {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("sender {}: unreadable SK", sender.id),
                });
            };

            let agree = if roster_date >= sender_date {
                advance(&sender_sk, elapsed(sender_date, roster_date)) == roster_sk
            } else {
                advance(&roster_sk, elapsed(roster_date, sender_date)) == sender_sk
            };
            if !agree {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "sender {}: roster SK ({roster_date}) diverged from sender SK ({sender_date})",
                        sender.id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// An infected sender's SK is `H(x ‖ y)` advanced once per day since creation.
pub struct InfectedSkBoundToKey;

impl Invariant for InfectedSkBoundToKey {
    fn name(&self) -> &'static str {
        "InfectedSkBoundToKey"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for sender in &state.senders {
            let (Some(public_key), Some(sk), Some(date)) =
                (&sender.public_key, &sender.sk, sender.last_sk_update)
            else {
                continue;
            };

            let expected = advance(&derive_sk(public_key), elapsed(sender.created_on, date));
            if expected.as_bytes().as_slice() != sk.as_slice() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "sender {}: SK on {date} is not H(x ‖ y) advanced from {}",
                        sender.id, sender.created_on
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A ciphertext cached on the SK's day decrypts to the broadcast secret.
pub struct CiphertextUnderCurrentSk;

impl Invariant for CiphertextUnderCurrentSk {
    fn name(&self) -> &'static str {
        "CiphertextUnderCurrentSk"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Ok(codec) = BlockCipherCodec::new(state.schedule, state.broadcast_secret.clone()) else {
            return Err(Violation {
                invariant: self.name(),
                message: format!("broadcast secret of {} bytes", state.broadcast_secret.len()),
            });
        };

        for sender in &state.senders {
            let (Some(sk), Some(ciphertext), Some(sk_date), Some(ct_date)) = (
                &sender.sk,
                &sender.ciphertext,
                sender.last_sk_update,
                sender.last_ciphertext_update,
            ) else {
                continue;
            };
            if sk_date != ct_date {
                continue;
            }

            let decrypts = SecretKey::from_slice(sk)
                .ok()
                .is_some_and(|sk| codec.decrypt(&sk, ciphertext).is_ok());
            if !decrypts {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("sender {}: ciphertext of {ct_date} not under its SK", sender.id),
                });
            }
        }
        Ok(())
    }
}

/// The packet log holds whole records, none repeated.
pub struct PacketLogWellFormed;

impl Invariant for PacketLogWellFormed {
    fn name(&self) -> &'static str {
        "PacketLogWellFormed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.packet_log.len() % PACKET_SIZE != 0 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("log of {} bytes", state.packet_log.len()),
            });
        }

        let mut seen = HashSet::new();
        for (index, record) in state.packet_log.chunks_exact(PACKET_SIZE).enumerate() {
            if !seen.insert(record) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("packet {index} is a duplicate"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scenario, SystemSnapshot};

    #[test]
    fn detects_ragged_roster() {
        let scenario = Scenario::new(3).unwrap();
        let mut snapshot = SystemSnapshot::capture(&scenario).unwrap();
        snapshot.roster_public_keys = vec![0; 64];
        snapshot.roster_sks = vec![0; 33];

        assert!(RosterAlignment.check(&snapshot).is_err());
        snapshot.roster_sks = vec![0; 64];
        assert!(RosterAlignment.check(&snapshot).is_err());
        snapshot.roster_sks = vec![0; 32];
        assert!(RosterAlignment.check(&snapshot).is_ok());
    }

    #[test]
    fn detects_duplicate_packets() {
        let scenario = Scenario::new(3).unwrap();
        let mut snapshot = SystemSnapshot::capture(&scenario).unwrap();
        snapshot.packet_log = vec![7; 2 * PACKET_SIZE];

        assert!(PacketLogWellFormed.check(&snapshot).is_err());
    }

    #[test]
    fn detects_foreign_sk() {
        let mut scenario = Scenario::new(3).unwrap();
        let id = scenario.add_sender(true).unwrap();
        scenario.broadcast(id).unwrap();

        let mut snapshot = SystemSnapshot::capture(&scenario).unwrap();
        assert!(InfectedSkBoundToKey.check(&snapshot).is_ok());
        assert!(CiphertextUnderCurrentSk.check(&snapshot).is_ok());

        snapshot.senders[id].sk = Some(vec![0xEE; SK_SIZE]);
        assert!(InfectedSkBoundToKey.check(&snapshot).is_err());
        assert!(CiphertextUnderCurrentSk.check(&snapshot).is_err());
    }
}
