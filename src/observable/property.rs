//! Unpersisted observable value.

use super::subscribers::{Subscribers, SubscriptionId};
use parking_lot::RwLock;

/// A value that notifies subscribers whenever it is replaced.
pub struct Observable<T> {
    name: &'static str,
    value: RwLock<T>,
    changed: Subscribers<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            value: RwLock::new(initial),
            changed: Subscribers::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value, then notify subscribers before returning.
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut guard = self.value.write();
            *guard = value;
            guard.clone()
        };
        self.changed.notify(&snapshot);
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

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new("value", T::default())
    }
}
