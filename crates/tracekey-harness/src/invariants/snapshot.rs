//! Raw state capture.

use chrono::NaiveDate;
use tracekey_core::{Error, MemoryStore, Store, store::keys};
use tracekey_crypto::{PublicKey, Schedule};

use crate::Scenario;

/// Persisted state of one sender, read without rotating anything.
#[derive(Debug, Clone)]
pub struct SenderSnapshot {
    /// Index in the scenario
    pub id: usize,
    /// Day the identity was opened
    pub created_on: NaiveDate,
    /// Public key, for infected senders
    pub public_key: Option<PublicKey>,
    /// Stored SK
    pub sk: Option<Vec<u8>>,
    /// Date of the stored SK
    pub last_sk_update: Option<NaiveDate>,
    /// Cached daily ciphertext
    pub ciphertext: Option<Vec<u8>>,
    /// Date of the cached ciphertext
    pub last_ciphertext_update: Option<NaiveDate>,
}

/// Every store of a scenario at one instant.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Simulated day
    pub today: NaiveDate,
    /// EphID window configuration
    pub schedule: Schedule,
    /// Provisioned broadcast secret
    pub broadcast_secret: Vec<u8>,
    /// One entry per sender
    pub senders: Vec<SenderSnapshot>,
    /// Receiver's `public_key_infected` blob
    pub roster_public_keys: Vec<u8>,
    /// Receiver's `sk_infected` blob
    pub roster_sks: Vec<u8>,
    /// Receiver's roster date
    pub roster_updated: Option<NaiveDate>,
    /// Receiver's packet log blob
    pub packet_log: Vec<u8>,
}

impl SystemSnapshot {
    /// Read every store of `scenario`.
    pub fn capture(scenario: &Scenario) -> Result<Self, Error> {
        use tracekey_core::Environment;

        let receiver = scenario.receiver();
        let senders = scenario
            .senders()
            .iter()
            .enumerate()
            .map(|(id, sender)| {
                let store = sender.identity.store();
                Ok(SenderSnapshot {
                    id,
                    created_on: sender.created_on,
                    public_key: sender
                        .identity
                        .as_infected()
                        .map(|infected| infected.key_pair().public_key().clone()),
                    sk: store.get(keys::SK)?,
                    last_sk_update: date(store, keys::LAST_SK_UPDATE)?,
                    ciphertext: store.get(keys::CIPHERTEXT)?,
                    last_ciphertext_update: date(store, keys::LAST_CIPHERTEXT_UPDATE)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            today: scenario.env().today(),
            schedule: scenario.scheduler().schedule(),
            broadcast_secret: scenario.authority().get(keys::BROADCAST_KEY)?.unwrap_or_default(),
            senders,
            roster_public_keys: receiver.get(keys::PUBLIC_KEY_INFECTED)?.unwrap_or_default(),
            roster_sks: receiver.get(keys::SK_INFECTED)?.unwrap_or_default(),
            roster_updated: date(receiver, keys::LAST_SK_INFECTED_UPDATE)?,
            packet_log: receiver.get(keys::EPHIDS)?.unwrap_or_default(),
        })
    }
}

fn date(store: &MemoryStore, key: &'static str) -> Result<Option<NaiveDate>, Error> {
    let Some(bytes) = store.get(key)? else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&bytes);
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| Error::CorruptState { key, reason: e.to_string() })
}
