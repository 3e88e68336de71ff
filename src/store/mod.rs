//! Durable Settings Store
//!
//! Port for the key-value backend that persists settings values. The
//! coordination layer never depends on the physical layout; it only reads and
//! writes JSON values by key.

pub mod memory;
pub mod persistence;

use crate::error::StorageError;
use serde_json::Value;

pub use memory::MemorySettingsStore;
pub use persistence::SledSettingsStore;

/// Durable settings store interface
///
/// `write` must be durable when it returns `Ok`: a fresh store opened over the
/// same backing location observes the value.
pub trait SettingsStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn write(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}
