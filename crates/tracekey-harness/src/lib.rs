//! Deterministic simulation harness for tracekey.
//!
//! A seeded [`SimEnv`] stands in for the calendar, clock and OS entropy, so
//! multi-day scenarios run instantly and reproducibly. [`Scenario`] wires
//! an authority, senders and a receiver to one environment; [`SimServer`]
//! judges reports in-process.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of the persisted state after
//! every step. Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, SenderSnapshot, SystemSnapshot, Violation,
};
pub use scenario::{Scenario, SenderId, SimSender};
pub use sim_env::SimEnv;
pub use sim_server::SimServer;
