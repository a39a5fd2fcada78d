//! The durable local cache: a small key/value string store.
//!
//! The sync engine writes the serialized ledger here synchronously on every
//! mutation, so this store must be durable and simple. Values live one file
//! per key under the cache directory; writes go to a temp file first and are
//! renamed into place.

use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// The fixed key under which the full serialized ledger is cached.
pub const LEDGER_KEY: &str = "ledger";

/// A key/value string store. The engine only ever needs get/set/remove of
/// whole values under a fixed key.
pub trait CacheStore: Send + Sync {
    /// The value for `key`, or `None` if it has never been set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Sets `key` to `value`, durably, before returning.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}

/// A `CacheStore` backed by one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates the store, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Unable to create cache directory {}", root.display()))?;
        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Unable to read cache file {}", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let tmp = self.root.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Unable to write cache file {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| {
            format!(
                "Unable to move cache file into place at {}",
                path.display()
            )
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Unable to remove cache file {}", path.display()))
            }
        }
    }
}

/// An in-memory `CacheStore`.
///
/// Note: this is compiled even in the "production" version of this crate so
/// that the whole engine can run, top-to-bottom, without touching the
/// filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value, e.g. a pre-existing (or corrupt) cached ledger.
    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .expect("cache mutex poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("cache")).unwrap();

        assert!(store.get(LEDGER_KEY).unwrap().is_none());
        store.set(LEDGER_KEY, "{\"Mar 2025\":{}}").unwrap();
        assert_eq!(
            store.get(LEDGER_KEY).unwrap().as_deref(),
            Some("{\"Mar 2025\":{}}")
        );

        store.remove(LEDGER_KEY).unwrap();
        assert!(store.get(LEDGER_KEY).unwrap().is_none());
        // Removing again is a no-op.
        store.remove(LEDGER_KEY).unwrap();
    }

    #[test]
    fn test_file_store_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
