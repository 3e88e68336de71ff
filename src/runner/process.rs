//! Backend that launches an external test command per project.

use super::{RunReport, RunRequest, TestRunner};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Configured external runner: `program args... <project_root>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Runs a configured program with the project root as its last argument.
///
/// Filters, settings file, and exclusions are passed through `TESTDECK_*`
/// environment variables.
pub struct ProcessRunner {
    name: String,
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(name: impl Into<String>, config: RunnerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn command(&self, request: &RunRequest) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg(&request.project_root)
            .env("TESTDECK_FILTERS", &request.filters)
            .env("TESTDECK_EXCLUDE_ATTRIBUTES", &request.exclude_attributes)
            .env("TESTDECK_EXCLUDE_FILES", &request.exclude_files)
            .env("TESTDECK_EXCLUDE_DIRECTORIES", &request.exclude_directories)
            .kill_on_drop(true);
        if let Some(settings_file) = &request.settings_file {
            command.env("TESTDECK_SETTINGS_FILE", settings_file);
        }
        if request.project_root.is_dir() {
            command.current_dir(&request.project_root);
        }
        command
    }
}

#[async_trait]
impl TestRunner for ProcessRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunReport, ApiError> {
        let started = Instant::now();
        debug!(
            runner = %self.name,
            program = %self.config.program,
            project = %request.project_name,
            "Launching test runner"
        );

        let status = self.command(request).status().await.map_err(|e| {
            ApiError::RunnerError(format!(
                "Failed to launch '{}' for runner {}: {}",
                self.config.program, self.name, e
            ))
        })?;

        let report = RunReport {
            runner: self.name.clone(),
            project_name: request.project_name.clone(),
            exit_code: status.code(),
            success: status.success(),
            duration_ms: started.elapsed().as_millis(),
        };
        info!(
            runner = %self.name,
            project = %request.project_name,
            success = report.success,
            exit_code = ?report.exit_code,
            "Test run finished"
        );
        Ok(report)
    }
}
