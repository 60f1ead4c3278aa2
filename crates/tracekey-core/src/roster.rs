//! Receiver-side list of infected identities.
//!
//! Two parallel record lists in the receiver's store: `public_key_infected`
//! (64-byte public keys) and `sk_infected` (32-byte SKs), where the i-th SK
//! belongs to the i-th public key. A shared `last_sk_infected_update` date
//! drives lazy rotation of every SK at once.

use chrono::NaiveDate;
use tracekey_crypto::{PUBLIC_KEY_SIZE, PublicKey, SK_SIZE, SecretKey, advance};
use tracing::debug;

use crate::{
    date,
    error::Error,
    store::{Store, keys, records},
};

/// One infected identity as seen by a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfectedEntry {
    /// The identity's public key
    pub public_key: PublicKey,
    /// Its SK for the roster's current day
    pub sk: SecretKey,
}

/// View over the infected roster kept in a receiver's store.
#[derive(Debug, Clone)]
pub struct InfectedRoster<S> {
    store: S,
}

impl<S: Store> InfectedRoster<S> {
    /// Open the roster kept in `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load all entries with SKs advanced to `today`.
    ///
    /// An absent public-key list is an empty roster, not an error. Rotated
    /// SKs and the new date are persisted.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredState`: if public keys exist but the SK list does not
    /// - `SizeMismatch`: if either list is not a whole number of records
    /// - `RosterMismatch`: if the lists hold different record counts
    /// - `InvalidKey`: if a listed public key is not on P-256
    pub fn load(&self, today: NaiveDate) -> Result<Vec<InfectedEntry>, Error> {
        let last_update = date::load_or_init(&self.store, keys::LAST_SK_INFECTED_UPDATE, today)?;

        let Some(public_key_bytes) = self.store.get(keys::PUBLIC_KEY_INFECTED)? else {
            // Nothing to rotate, but SKs published later are today's
            if last_update != today {
                self.store.put(keys::LAST_SK_INFECTED_UPDATE, &date::encode(today))?;
            }
            debug!("no infected public keys, roster is empty");
            return Ok(Vec::new());
        };
        let sk_bytes = self
            .store
            .get(keys::SK_INFECTED)?
            .ok_or(Error::MissingRequiredState { key: keys::SK_INFECTED })?;

        let public_keys = records(keys::PUBLIC_KEY_INFECTED, &public_key_bytes, PUBLIC_KEY_SIZE)?;
        let sks = records(keys::SK_INFECTED, &sk_bytes, SK_SIZE)?;
        if public_keys.len() != sks.len() {
            return Err(Error::RosterMismatch {
                public_keys: public_keys.len(),
                secret_keys: sks.len(),
            });
        }

        let days = date::elapsed_days(last_update, today);
        let entries = public_keys
            .zip(sks)
            .map(|(public_key, sk)| {
                Ok(InfectedEntry {
                    public_key: PublicKey::from_bytes(public_key)?,
                    sk: advance(&SecretKey::from_slice(sk)?, days),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        if days > 0 {
            let rotated: Vec<u8> =
                entries.iter().flat_map(|entry| entry.sk.as_bytes().iter().copied()).collect();
            self.store.put(keys::SK_INFECTED, &rotated)?;
            self.store.put(keys::LAST_SK_INFECTED_UPDATE, &date::encode(today))?;
            debug!(%last_update, %today, days, identities = entries.len(), "rotated infected SKs");
        }

        Ok(entries)
    }

    /// List an infected identity with its SK for `today`.
    ///
    /// Brings the roster to `today` first, then appends the pair only when the
    /// public key is not listed yet, keeping both lists in step. Returns
    /// whether the pair was added.
    pub fn publish(
        &self,
        public_key: &PublicKey,
        sk: &SecretKey,
        today: NaiveDate,
    ) -> Result<bool, Error> {
        let entries = self.load(today)?;
        if entries.iter().any(|entry| &entry.public_key == public_key) {
            return Ok(false);
        }

        self.store.append(keys::PUBLIC_KEY_INFECTED, &public_key.to_bytes())?;
        self.store.append(keys::SK_INFECTED, sk.as_bytes())?;
        debug!(?public_key, "published infected identity");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tracekey_crypto::IdentityKeyPair;

    use super::*;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn key_pair(byte: u8) -> IdentityKeyPair {
        IdentityKeyPair::from_private_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn absent_roster_is_empty() {
        let roster = InfectedRoster::new(MemoryStore::new());
        assert!(roster.load(day(1)).unwrap().is_empty());
    }

    #[test]
    fn first_publish_after_idle_days_is_dated_today() {
        let store = MemoryStore::new();
        let roster = InfectedRoster::new(store.clone());
        roster.load(day(1)).unwrap();

        let kp = key_pair(7);
        let sk_today = advance(&kp.initial_sk(), 4);
        roster.publish(kp.public_key(), &sk_today, day(5)).unwrap();

        assert_eq!(roster.load(day(5)).unwrap()[0].sk, sk_today);
        assert_eq!(roster.load(day(6)).unwrap()[0].sk, advance(&sk_today, 1));
    }

    #[test]
    fn publish_then_load() {
        let store = MemoryStore::new();
        let roster = InfectedRoster::new(store.clone());
        let kp = key_pair(7);

        assert!(roster.publish(kp.public_key(), &kp.initial_sk(), day(1)).unwrap());
        assert!(!roster.publish(kp.public_key(), &kp.initial_sk(), day(1)).unwrap());

        let entries = roster.load(day(1)).unwrap();
        assert_eq!(entries, vec![InfectedEntry {
            public_key: kp.public_key().clone(),
            sk: kp.initial_sk()
        }]);
    }

    #[test]
    fn load_rotates_every_sk_and_persists() {
        let store = MemoryStore::new();
        let roster = InfectedRoster::new(store.clone());
        let (a, b) = (key_pair(7), key_pair(8));
        roster.publish(a.public_key(), &a.initial_sk(), day(1)).unwrap();
        roster.publish(b.public_key(), &b.initial_sk(), day(1)).unwrap();

        let entries = roster.load(day(4)).unwrap();
        assert_eq!(entries[0].sk, advance(&a.initial_sk(), 3));
        assert_eq!(entries[1].sk, advance(&b.initial_sk(), 3));

        let persisted = store.get(keys::SK_INFECTED).unwrap().unwrap();
        assert_eq!(&persisted[32..], advance(&b.initial_sk(), 3).as_bytes());
        assert_eq!(store.get(keys::LAST_SK_INFECTED_UPDATE).unwrap(), Some(b"2024-09-04".to_vec()));

        // Already current: no further rotation
        assert_eq!(roster.load(day(4)).unwrap(), entries);
    }

    #[test]
    fn publish_on_later_day_keeps_lists_aligned() {
        let store = MemoryStore::new();
        let roster = InfectedRoster::new(store.clone());
        let (a, b) = (key_pair(7), key_pair(8));
        roster.publish(a.public_key(), &a.initial_sk(), day(1)).unwrap();

        let b_today = advance(&b.initial_sk(), 5);
        roster.publish(b.public_key(), &b_today, day(6)).unwrap();

        let entries = roster.load(day(6)).unwrap();
        assert_eq!(entries[0].sk, advance(&a.initial_sk(), 5));
        assert_eq!(entries[1].sk, b_today);
    }

    #[test]
    fn missing_sk_list_is_missing_state() {
        let store = MemoryStore::new();
        store.put(keys::PUBLIC_KEY_INFECTED, &key_pair(7).public_key_bytes()).unwrap();

        assert_eq!(
            InfectedRoster::new(store).load(day(1)),
            Err(Error::MissingRequiredState { key: "sk_infected" })
        );
    }

    #[test]
    fn count_mismatch_is_roster_mismatch() {
        let store = MemoryStore::new();
        store.put(keys::PUBLIC_KEY_INFECTED, &key_pair(7).public_key_bytes()).unwrap();
        store.put(keys::SK_INFECTED, &[0u8; 64]).unwrap();

        assert_eq!(
            InfectedRoster::new(store).load(day(1)),
            Err(Error::RosterMismatch { public_keys: 1, secret_keys: 2 })
        );
    }

    #[test]
    fn ragged_lists_are_size_mismatch() {
        let store = MemoryStore::new();
        store.put(keys::PUBLIC_KEY_INFECTED, &[0u8; 65]).unwrap();
        store.put(keys::SK_INFECTED, &[0u8; 32]).unwrap();

        assert_eq!(
            InfectedRoster::new(store).load(day(1)),
            Err(Error::SizeMismatch { what: "public_key_infected", expected: 64, actual: 65 })
        );
    }

    #[test]
    fn off_curve_key_is_invalid_key() {
        let store = MemoryStore::new();
        let mut bytes = key_pair(7).public_key_bytes();
        bytes[63] ^= 1;
        store.put(keys::PUBLIC_KEY_INFECTED, &bytes).unwrap();
        store.put(keys::SK_INFECTED, &[0u8; 32]).unwrap();

        assert!(matches!(InfectedRoster::new(store).load(day(1)), Err(Error::InvalidKey { .. })));
    }
}
