#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use super::{Store, StorageError};

/// In-memory store for testing and simulation
///
/// All state is wrapped in Arc<Mutex<>> so clones share one namespace. Uses
/// `lock().expect()` which will panic if the mutex is poisoned - acceptable
/// for test and simulation code.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently holding a value, in sorted order.
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().expect("Mutex poisoned").keys().cloned().collect()
    }

    /// Remove the value under `key`, returning it.
    ///
    /// Lets tests simulate a lost or deleted file.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().expect("Mutex poisoned").remove(key)
    }
}

impl Store for MemoryStore {
    #[allow(clippy::expect_used)]
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").get(key).cloned())
    }

    #[allow(clippy::expect_used)]
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").insert(key.to_string(), value.to_vec());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn append(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(value);
        Ok(())
    }
}
