//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Unlike
//! [`DirStore`](super::DirStore), an interrupted append never leaves a torn
//! record behind.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{Store, StorageError};

/// Table: state
/// Key: store key (e.g. "sk", "ephids")
/// Value: raw blob
const STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("state");

/// Durable store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the STATE table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Store for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;

        let value = table.get(key).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
            table.insert(key, value).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))
    }

    fn append(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;

            let mut combined = match table.get(key).map_err(|e| StorageError::Io(e.to_string()))? {
                Some(existing) => existing.value().to_vec(),
                None => Vec::with_capacity(value.len()),
            };
            combined.extend_from_slice(value);

            table.insert(key, combined.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))
    }
}
