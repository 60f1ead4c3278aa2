//! One-file-per-key store.
//!
//! Mirrors the on-disk layout shared by the sender, receiver and server
//! tools: each identity owns a directory and every key is a plain file in
//! it. Interoperates with anything that reads or writes those files.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use super::{Store, StorageError};

/// Store backed by a directory of plain files.
///
/// Clone is cheap (a path). Writes are not atomic; a crash mid-write can
/// leave a truncated file, which later surfaces as `SizeMismatch`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Self { root })
    }

    /// Directory holding the files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let plain = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.contains('\0');
        if !plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl Store for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("{key}: {e}"))),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        fs::write(self.path_for(key)?, value).map_err(|e| StorageError::Io(format!("{key}: {e}")))
    }

    fn append(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(key)?)
            .map_err(|e| StorageError::Io(format!("{key}: {e}")))?;
        file.write_all(value).map_err(|e| StorageError::Io(format!("{key}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_files_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path().join("receiver")).unwrap();

        store.put("sk", &[7u8; 32]).unwrap();
        assert_eq!(fs::read(dir.path().join("receiver").join("sk")).unwrap(), vec![7u8; 32]);
        assert_eq!(store.get("sk").unwrap(), Some(vec![7u8; 32]));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        assert_eq!(store.get("ciphertext").unwrap(), None);
    }

    #[test]
    fn append_creates_then_extends() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.append("ephids", b"ab").unwrap();
        store.append("ephids", b"cd").unwrap();
        assert_eq!(store.get("ephids").unwrap(), Some(b"abcd".to_vec()));
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        for key in ["", ".", "..", "../sk", "a/b"] {
            assert_eq!(store.get(key), Err(StorageError::InvalidKey(key.to_string())));
        }
    }
}
