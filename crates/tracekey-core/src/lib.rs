//! Key-schedule state machine for tracekey.
//!
//! Builds the proximity-tracing protocol on top of `tracekey-crypto`:
//! identities whose SKs rotate lazily each day, a scheduler that caches one
//! ciphertext per day and hands out the EphID for the current window, the
//! receiver's packet log and infected roster, brute-force matching, and
//! signed contact reports.
//!
//! ```text
//! sender                          receiver                       server
//! ──────                          ────────                       ──────
//! Identity ─► daily ciphertext    PacketLog ◄─ packets
//!          ─► next_packet ──────► InfectedRoster (pk, SK)
//!                                 match_packets ─► report_matches ─► ReportVerdict
//! ```
//!
//! # Architecture
//!
//! - All state lives behind the [`Store`] trait, one store per identity
//! - All time and randomness comes from the [`Environment`] trait
//! - Everything is synchronous and single-threaded; rotation happens on access
//!
//! Storage backends: [`MemoryStore`] for tests and simulation, [`DirStore`]
//! for the one-file-per-key layout, [`RedbStore`] for a single ACID file.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod date;
pub mod env;
pub mod error;
pub mod identity;
pub mod key_chain;
pub mod matcher;
pub mod packet;
pub mod provision;
pub mod report;
pub mod roster;
pub mod scheduler;
pub mod sender;
pub mod store;

#[cfg(test)]
mod test_env;

pub use env::Environment;
pub use error::Error;
pub use identity::{Identity, InfectedIdentity, PlainIdentity};
pub use key_chain::{KeyChain, RandomSk, SkSource};
pub use matcher::{PacketMatch, match_packets};
pub use packet::{PACKET_SIZE, Packet, PacketLog};
pub use provision::BroadcastSecret;
pub use report::{REPORT_SIZE, Report, ReportTransport, ReportVerdict, report_matches};
pub use roster::{InfectedEntry, InfectedRoster};
pub use scheduler::EphemeralIdScheduler;
pub use sender::next_packet;
pub use store::{ChaoticStore, DirStore, MemoryStore, RedbStore, StorageError, Store, append_unique};
pub use tracekey_crypto as crypto;
