//! Test runner capability and the multiplexer that makes the backend pluggable.
//!
//! Two capabilities live on the multiplexer: [`TestRunner`] performs a run,
//! [`Multiplexer`] administers which registered backend performs it. Callers are
//! typed against whichever one they need.

mod multiplexer;
mod process;

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use multiplexer::{RunnerMultiplexer, StrategyMultiplexer};
pub use process::{ProcessRunner, RunnerConfig};

/// Inputs handed to a backend for one project run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub project_name: String,
    pub project_root: PathBuf,
    /// Filter expression selecting tests
    pub filters: String,
    /// Selected test settings file, if any
    pub settings_file: Option<PathBuf>,
    pub exclude_attributes: String,
    pub exclude_files: String,
    pub exclude_directories: String,
}

/// Outcome reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub runner: String,
    pub project_name: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration_ms: u128,
}

/// Test execution capability.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunReport, ApiError>;
}

/// Administration capability: which implementation is active.
pub trait Multiplexer: Send + Sync {
    /// Registered implementation names, in registration order.
    fn implementations(&self) -> Vec<String>;

    /// Name of the active implementation, if any is registered.
    fn active_name(&self) -> Option<String>;

    /// Switch the active implementation. Fails with
    /// [`ApiError::UnknownImplementation`] and leaves the selection unchanged
    /// when `name` is not registered.
    fn set_active(&self, name: &str) -> Result<(), ApiError>;

    fn contains(&self, name: &str) -> bool {
        self.implementations().iter().any(|n| n == name)
    }
}
