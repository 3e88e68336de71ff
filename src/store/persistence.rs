//! Sled-backed settings persistence.

use super::SettingsStore;
use crate::error::StorageError;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const SETTINGS_TREE: &str = "settings";

/// Settings store persisted in a sled tree, one JSON document per key.
pub struct SledSettingsStore {
    tree: sled::Tree,
}

impl SledSettingsStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Use the `settings` tree of an already opened database.
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(SETTINGS_TREE)?;
        Ok(Self { tree })
    }
}

impl SettingsStore for SledSettingsStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.tree.insert(key.as_bytes(), bytes)?;
        self.tree.flush()?;
        debug!(key, "Persisted setting");
        Ok(())
    }
}
