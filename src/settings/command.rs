//! User-invocable commands with enablement predicates.

use crate::error::ApiError;
use crate::observable::{Subscribers, SubscriptionId};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

type ExecuteFn<P> = Box<dyn Fn(P) -> BoxFuture<'static, Result<(), ApiError>> + Send + Sync>;
type CanExecuteFn<P> = Box<dyn Fn(&P) -> bool + Send + Sync>;

/// Handle that raises a command's can-execute-changed notification.
///
/// Held by property subscriptions so the command is re-evaluated whenever a
/// property it depends on changes.
#[derive(Clone)]
pub struct CommandTrigger {
    subscribers: Arc<Subscribers<()>>,
}

impl CommandTrigger {
    pub fn fire(&self) {
        self.subscribers.notify(&());
    }
}

/// Command built from an async action and an optional enablement predicate.
pub struct DelegateCommand<P> {
    name: &'static str,
    execute: ExecuteFn<P>,
    can_execute: Option<CanExecuteFn<P>>,
    can_execute_changed: Arc<Subscribers<()>>,
}

impl<P: Send + 'static> DelegateCommand<P> {
    pub fn new<F, Fut>(name: &'static str, execute: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        Self {
            name,
            execute: Box::new(move |parameter| execute(parameter).boxed()),
            can_execute: None,
            can_execute_changed: Arc::new(Subscribers::new()),
        }
    }

    pub fn with_can_execute<F>(mut self, can_execute: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.can_execute = Some(Box::new(can_execute));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_execute(&self, parameter: &P) -> bool {
        self.can_execute
            .as_ref()
            .map(|predicate| predicate(parameter))
            .unwrap_or(true)
    }

    /// Run the action. Fails with [`ApiError::CommandDisabled`] when the
    /// predicate currently rejects `parameter`.
    pub async fn execute(&self, parameter: P) -> Result<(), ApiError> {
        if !self.can_execute(&parameter) {
            return Err(ApiError::CommandDisabled(self.name.to_string()));
        }
        (self.execute)(parameter).await
    }

    pub fn trigger(&self) -> CommandTrigger {
        CommandTrigger {
            subscribers: Arc::clone(&self.can_execute_changed),
        }
    }

    pub fn subscribe_can_execute_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.can_execute_changed.subscribe(callback)
    }
}
