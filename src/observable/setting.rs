//! Persisted observable setting.

use super::subscribers::{Subscribers, SubscriptionId};
use crate::error::ApiError;
use crate::store::SettingsStore;
use crate::types::SettingKey;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A named, typed value backed by the durable settings store.
///
/// Writers are serialized. The store write runs on the blocking pool and is
/// the only suspension point of `set`; readers keep seeing the previous value
/// until it has been made durable. A rejected write leaves the value and the
/// subscribers untouched.
pub struct Setting<T> {
    key: SettingKey,
    default: T,
    value: RwLock<T>,
    writer: Mutex<()>,
    store: Arc<dyn SettingsStore>,
    changed: Subscribers<T>,
}

impl<T> Setting<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load the setting from `store`, falling back to `default` when the key
    /// was never written or cannot be read back.
    pub fn load(key: SettingKey, default: T, store: Arc<dyn SettingsStore>) -> Self {
        let initial = match store.read(key) {
            Ok(Some(raw)) => match serde_json::from_value::<T>(raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key, error = %e, "Stored setting has unexpected shape, using default");
                    default.clone()
                }
            },
            Ok(None) => default.clone(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read setting, using default");
                default.clone()
            }
        };

        Self {
            key,
            default,
            value: RwLock::new(initial),
            writer: Mutex::new(()),
            store,
            changed: Subscribers::new(),
        }
    }

    pub fn key(&self) -> SettingKey {
        self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Last successfully written value, or the default.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Write a new value durably, then publish it and notify subscribers.
    pub async fn set(&self, value: T) -> Result<(), ApiError> {
        let encoded = serde_json::to_value(&value)
            .map_err(|e| ApiError::persistence(self.key, e.into()))?;

        let _writer = self.writer.lock().await;
        let store = Arc::clone(&self.store);
        let key = self.key;
        let written = tokio::task::spawn_blocking(move || store.write(key, &encoded))
            .await
            .map_err(|e| ApiError::TaskFailed(format!("Setting write for '{}': {}", key, e)))?;
        if let Err(e) = written {
            warn!(key, error = %e, "Setting write rejected by store");
            return Err(ApiError::persistence(key, e));
        }

        *self.value.write() = value.clone();
        debug!(key, "Setting updated");
        self.changed.notify(&value);
        Ok(())
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.changed.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}
