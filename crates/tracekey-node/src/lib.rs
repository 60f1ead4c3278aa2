//! tracekey command-line node.
//!
//! Runs the roles of the protocol against on-disk state: the provisioning
//! authority, an infected and a non-infected sender, the receiver and the
//! report server. Time and randomness come from the host via [`SystemEnv`];
//! all protocol logic lives in [`tracekey_core`].
//!
//! # Components
//!
//! - [`NodeConfig`] and [`Stores`]: data directory layout and backends
//! - [`commands`]: `provision`, `send`, `receive`, `check_report`
//! - [`LoopbackTransport`]: in-process report server
//! - [`SystemEnv`]: production environment (local clock, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod config;
mod error;
mod system_env;
mod transport;

pub use commands::{ReceiveOutcome, SendOutcome, check_report, provision, receive, send};
pub use config::{Backend, NodeConfig, Role, Stores};
pub use error::NodeError;
pub use system_env::SystemEnv;
pub use transport::LoopbackTransport;
