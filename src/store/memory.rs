//! In-process settings store.

use super::SettingsStore;
use crate::error::StorageError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Settings store kept in memory for the lifetime of the value.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that have been written.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.clone());
        Ok(())
    }
}
