//! Storage abstraction for per-identity key-schedule state
//!
//! Each identity (sender, receiver, provisioning authority) owns one store:
//! a flat namespace of byte blobs addressed by a fixed set of [`keys`]. The
//! trait is synchronous; all state machines access it lazily on demand.

mod chaotic;
mod dir;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStore;
pub use dir::DirStore;
pub use error::StorageError;
pub use memory::MemoryStore;

pub use self::redb::RedbStore;
use crate::error::Error;

/// Store keys used by the key schedule.
///
/// The names double as file names in a [`DirStore`].
pub mod keys {
    /// Current secret key (32 bytes).
    pub const SK: &str = "sk";
    /// Date of the last SK rotation (`YYYY-MM-DD`).
    pub const LAST_SK_UPDATE: &str = "last_sk_update";
    /// Cached daily ciphertext (`IV ‖ C`).
    pub const CIPHERTEXT: &str = "ciphertext";
    /// Date the cached ciphertext was produced (`YYYY-MM-DD`).
    pub const LAST_CIPHERTEXT_UPDATE: &str = "last_ciphertext_update";
    /// Private scalar of an infected identity (32 bytes).
    pub const PRIVATE_KEY: &str = "private_key";
    /// Public key `x ‖ y` of an infected identity (64 bytes).
    pub const PUBLIC_KEY: &str = "public_key";
    /// Concatenated public keys of infected identities.
    pub const PUBLIC_KEY_INFECTED: &str = "public_key_infected";
    /// Concatenated SKs, parallel to [`PUBLIC_KEY_INFECTED`].
    pub const SK_INFECTED: &str = "sk_infected";
    /// Date the infected SKs were last rotated (`YYYY-MM-DD`).
    pub const LAST_SK_INFECTED_UPDATE: &str = "last_sk_infected_update";
    /// Received packet log.
    pub const EPHIDS: &str = "ephids";
    /// Shared broadcast secret.
    pub const BROADCAST_KEY: &str = "broadcast_key";
    /// Reports confirmed by the server.
    pub const CONFIRMED: &str = "confirmed";
}

/// Byte-blob storage for key-schedule state
///
/// Must be Clone (shared between the identity, scheduler and roster views of
/// one directory), Send + Sync, and synchronous. Implementations typically
/// share internal state via Arc, so clones access the same underlying store.
pub trait Store: Clone + Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// Returns `None` if nothing has been stored yet. Absence is never an
    /// error at this layer.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Append `value` to the blob under `key`, creating it if absent.
    fn append(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Load `key`, initializing it with `init` on first access.
    ///
    /// Returns the value and whether it was just created. `init` runs at most
    /// once and its value is persisted before returning.
    fn load_or_init<F, E>(&self, key: &str, init: F) -> Result<(Vec<u8>, bool), E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
        E: From<StorageError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok((value, false));
        }

        let value = init()?;
        self.put(key, &value)?;
        Ok((value, true))
    }
}

/// Append a fixed-width `record` unless an identical one is already stored.
///
/// Returns whether the record was appended.
///
/// # Errors
///
/// - `SizeMismatch`: if the existing blob is not a whole number of records
pub fn append_unique<S: Store>(store: &S, key: &'static str, record: &[u8]) -> Result<bool, Error> {
    if record.is_empty() {
        return Ok(false);
    }

    if let Some(existing) = store.get(key)? {
        if existing.len() % record.len() != 0 {
            return Err(Error::SizeMismatch {
                what: key,
                expected: record.len(),
                actual: existing.len(),
            });
        }
        if existing.chunks_exact(record.len()).any(|stored| stored == record) {
            return Ok(false);
        }
    }

    store.append(key, record)?;
    Ok(true)
}

/// Split a record list into fixed-width records.
///
/// # Errors
///
/// - `SizeMismatch`: if the blob is not a whole number of records
pub(crate) fn records<'a>(
    key: &'static str,
    blob: &'a [u8],
    width: usize,
) -> Result<std::slice::ChunksExact<'a, u8>, Error> {
    if blob.len() % width != 0 {
        return Err(Error::SizeMismatch { what: key, expected: width, actual: blob.len() });
    }
    Ok(blob.chunks_exact(width))
}
