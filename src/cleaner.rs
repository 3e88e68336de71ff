//! Output cleaner contract: measuring and deleting per-project test output.

mod fs;

use crate::error::ApiError;
use crate::types::ProjectId;
use crate::workspace::TestProject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use fs::{CleanerConfig, FsOutputCleaner};

/// One output directory and what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDirectory {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub file_count: u64,
}

/// Output annotation attached to a project node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub project: ProjectId,
    pub directories: Vec<OutputDirectory>,
    pub measured_at: DateTime<Utc>,
}

impl OutputDescriptor {
    pub fn new(project: impl Into<ProjectId>, directories: Vec<OutputDirectory>) -> Self {
        Self {
            project: project.into(),
            directories,
            measured_at: Utc::now(),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.directories.iter().map(|d| d.size_bytes).sum()
    }

    pub fn file_count(&self) -> u64 {
        self.directories.iter().map(|d| d.file_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

/// Output cleaner
#[async_trait]
pub trait OutputCleaner: Send + Sync {
    /// Delete everything the descriptor names. Completes once deletion has.
    async fn clean_output(&self, target: &OutputDescriptor) -> Result<(), ApiError>;

    /// Measure a project's current output.
    async fn get_output_files(&self, project: &TestProject) -> Result<OutputDescriptor, ApiError>;
}

/// Human-readable byte size (`1.5 KiB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
