//! Durable key-value persistence for the pack store.
//!
//! The store only needs `get`/`set`/`remove` of string values under string
//! keys; the host environment decides what backs it. [`FsStorage`] keeps
//! each key as a pretty-printed JSON file under a root directory, and
//! [`MemoryStorage`] backs tests and ephemeral sessions.

use crate::error::{Error, Result};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Mutex;

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed storage: one `<key>.json` file per key.
pub struct FsStorage {
    root: Utf8PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Utf8PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FsStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path.as_std_path())?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(self.root.as_std_path())?;
        fs::write(self.path_for(key).as_std_path(), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.as_std_path().exists() {
            fs::remove_file(path.as_std_path())?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and sessions without a durable backend.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage mutex poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
