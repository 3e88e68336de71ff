//! Named registry of interchangeable implementations with one active pointer.

use super::{Multiplexer, RunReport, RunRequest, TestRunner};
use crate::error::ApiError;
use crate::observable::{Subscribers, SubscriptionId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

struct Registry<C: ?Sized> {
    /// Registration order is the listing order
    entries: Vec<(String, Arc<C>)>,
    active: Option<String>,
}

/// Multiplexer over implementations of capability `C`.
///
/// Invariant: `active`, when set, names a registered entry. The first
/// registered implementation becomes active.
pub struct StrategyMultiplexer<C: ?Sized> {
    registry: RwLock<Registry<C>>,
    changed: Subscribers<String>,
}

/// Multiplexer over test execution backends.
pub type RunnerMultiplexer = StrategyMultiplexer<dyn TestRunner>;

impl<C: ?Sized + Send + Sync> StrategyMultiplexer<C> {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry {
                entries: Vec::new(),
                active: None,
            }),
            changed: Subscribers::new(),
        }
    }

    /// Register an implementation under a unique name.
    pub fn register(&self, name: impl Into<String>, implementation: Arc<C>) -> Result<(), ApiError> {
        let name = name.into();
        let mut registry = self.registry.write();
        if registry.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(ApiError::ConfigError(format!(
                "Implementation already registered: {}",
                name
            )));
        }
        if registry.active.is_none() {
            registry.active = Some(name.clone());
        }
        registry.entries.push((name, implementation));
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(self, name: impl Into<String>, implementation: Arc<C>) -> Result<Self, ApiError> {
        self.register(name, implementation)?;
        Ok(self)
    }

    /// The implementation every caller of the capability is routed to.
    pub fn active(&self) -> Result<Arc<C>, ApiError> {
        let registry = self.registry.read();
        let active = registry.active.as_deref().ok_or_else(|| {
            ApiError::CollaboratorUnavailable("No implementation registered".to_string())
        })?;
        registry
            .entries
            .iter()
            .find(|(name, _)| name == active)
            .map(|(_, implementation)| Arc::clone(implementation))
            .ok_or_else(|| ApiError::UnknownImplementation(active.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<C>> {
        self.registry
            .read()
            .entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, implementation)| Arc::clone(implementation))
    }

    pub fn len(&self) -> usize {
        self.registry.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.read().entries.is_empty()
    }

    /// Subscribe to active-name changes.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.changed.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}

impl<C: ?Sized + Send + Sync> Default for StrategyMultiplexer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized + Send + Sync> Multiplexer for StrategyMultiplexer<C> {
    fn implementations(&self) -> Vec<String> {
        self.registry
            .read()
            .entries
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn active_name(&self) -> Option<String> {
        self.registry.read().active.clone()
    }

    fn set_active(&self, name: &str) -> Result<(), ApiError> {
        {
            let mut registry = self.registry.write();
            if !registry.entries.iter().any(|(existing, _)| existing == name) {
                return Err(ApiError::UnknownImplementation(name.to_string()));
            }
            registry.active = Some(name.to_string());
        }
        info!(implementation = name, "Active implementation switched");
        self.changed.notify(&name.to_string());
        Ok(())
    }
}

#[async_trait]
impl TestRunner for RunnerMultiplexer {
    async fn run(&self, request: &RunRequest) -> Result<RunReport, ApiError> {
        let runner = self.active()?;
        runner.run(request).await
    }
}
