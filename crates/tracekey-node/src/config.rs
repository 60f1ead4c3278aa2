//! Node configuration and on-disk layout.
//!
//! ```text
//! <data>/broadcast_key     provisioning authority (dir backend)
//! <data>/infected/         infected sender
//! <data>/not_infected/     sender that is not infected
//! <data>/receiver/         packet log and infected roster
//! <data>/server/           confirmed reports
//! ```
//!
//! With the redb backend each role is a single `<data>/<role>.redb` file.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracekey_core::{DirStore, RedbStore, Store};
use tracekey_crypto::Schedule;

use crate::error::NodeError;

/// Storage backend for every role's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// One plain file per key
    #[default]
    Dir,
    /// One redb database per role
    Redb,
}

/// Parties that keep state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Holder of the broadcast secret
    Authority,
    /// Infected sender
    Infected,
    /// Sender that is not infected
    NotInfected,
    /// Receiver
    Receiver,
    /// Report server
    Server,
}

impl Role {
    /// Directory (or database stem) name under the data directory.
    pub fn name(self) -> &'static str {
        match self {
            Self::Authority => "authority",
            Self::Infected => "infected",
            Self::NotInfected => "not_infected",
            Self::Receiver => "receiver",
            Self::Server => "server",
        }
    }
}

/// Node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Root of the on-disk layout
    pub data_dir: PathBuf,
    /// EphID window configuration
    pub schedule: Schedule,
    /// Storage backend
    pub backend: Backend,
}

impl NodeConfig {
    /// Validate and build a configuration.
    ///
    /// # Errors
    ///
    /// - `Config`: if `window_minutes` does not divide the day
    pub fn new(
        data_dir: impl Into<PathBuf>,
        window_minutes: u32,
        backend: Backend,
    ) -> Result<Self, NodeError> {
        let schedule = Schedule::new(window_minutes)
            .map_err(|e| NodeError::Config(format!("--window {window_minutes}: {e}")))?;
        Ok(Self { data_dir: data_dir.into(), schedule, backend })
    }

    fn dir_for(&self, role: Role) -> PathBuf {
        match role {
            // The broadcast key sits at the top of the layout
            Role::Authority => self.data_dir.clone(),
            _ => self.data_dir.join(role.name()),
        }
    }

    fn redb_for(&self, role: Role) -> PathBuf {
        self.data_dir.join(format!("{}.redb", role.name()))
    }
}

/// One open store per role.
#[derive(Clone)]
pub struct Stores<S> {
    /// Broadcast secret
    pub authority: S,
    /// Infected sender state
    pub infected: S,
    /// State of the sender that is not infected
    pub not_infected: S,
    /// Receiver state
    pub receiver: S,
    /// Report server state
    pub server: S,
}

impl<S: Store> Stores<S> {
    /// Open every role with `open`.
    pub fn open_with<F>(mut open: F) -> Result<Self, NodeError>
    where
        F: FnMut(Role) -> Result<S, NodeError>,
    {
        Ok(Self {
            authority: open(Role::Authority)?,
            infected: open(Role::Infected)?,
            not_infected: open(Role::NotInfected)?,
            receiver: open(Role::Receiver)?,
            server: open(Role::Server)?,
        })
    }

    /// Sender store for the chosen infection status.
    pub fn sender(&self, infected: bool) -> &S {
        if infected { &self.infected } else { &self.not_infected }
    }
}

impl Stores<DirStore> {
    /// Open the one-file-per-key layout under `config.data_dir`.
    pub fn open_dir(config: &NodeConfig) -> Result<Self, NodeError> {
        Self::open_with(|role| Ok(DirStore::open(config.dir_for(role))?))
    }
}

impl Stores<RedbStore> {
    /// Open one redb database per role under `config.data_dir`.
    pub fn open_redb(config: &NodeConfig) -> Result<Self, NodeError> {
        create_dir(&config.data_dir)?;
        Self::open_with(|role| Ok(RedbStore::open(config.redb_for(role))?))
    }
}

fn create_dir(path: &Path) -> Result<(), NodeError> {
    std::fs::create_dir_all(path)
        .map_err(|source| NodeError::Io { path: path.to_path_buf(), source })
}
