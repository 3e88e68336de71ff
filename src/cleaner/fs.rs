//! Filesystem output cleaner.

use super::{OutputCleaner, OutputDescriptor, OutputDirectory};
use crate::error::ApiError;
use crate::workspace::TestProject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

fn default_output_dirs() -> Vec<String> {
    vec!["TestResults".to_string(), "coverage".to_string()]
}

/// Cleaner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Directory names under each project root that hold test output
    #[serde(default = "default_output_dirs")]
    pub output_dirs: Vec<String>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            output_dirs: default_output_dirs(),
        }
    }
}

/// Measures and deletes the configured output directories of each project.
///
/// Only directories whose name is one of `output_dirs` are ever deleted.
pub struct FsOutputCleaner {
    config: CleanerConfig,
}

impl FsOutputCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    fn is_output_dir(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.config.output_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
    }
}

impl Default for FsOutputCleaner {
    fn default() -> Self {
        Self::new(CleanerConfig::default())
    }
}

fn measure(path: PathBuf) -> OutputDirectory {
    let (size_bytes, file_count) = WalkDir::new(&path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .fold((0u64, 0u64), |(size, count), metadata| {
            (size + metadata.len(), count + 1)
        });
    OutputDirectory {
        path,
        size_bytes,
        file_count,
    }
}

#[async_trait]
impl OutputCleaner for FsOutputCleaner {
    async fn clean_output(&self, target: &OutputDescriptor) -> Result<(), ApiError> {
        for directory in &target.directories {
            if !self.is_output_dir(&directory.path) {
                return Err(ApiError::ConfigError(format!(
                    "Refusing to clean {}: not a configured output directory",
                    directory.path.display()
                )));
            }
        }

        for directory in &target.directories {
            match tokio::fs::remove_dir_all(&directory.path).await {
                Ok(()) => debug!(path = %directory.path.display(), "Removed output directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ApiError::project_query(
                        target.project.clone(),
                        format!("failed to remove {}: {}", directory.path.display(), e),
                    ))
                }
            }
        }

        info!(
            project = %target.project,
            directories = target.directories.len(),
            "Cleaned test output"
        );
        Ok(())
    }

    async fn get_output_files(&self, project: &TestProject) -> Result<OutputDescriptor, ApiError> {
        if !project.root.is_dir() {
            return Err(ApiError::project_query(
                project.name.clone(),
                format!("project root {} does not exist", project.root.display()),
            ));
        }

        let candidates: Vec<PathBuf> = self
            .config
            .output_dirs
            .iter()
            .map(|name| project.root.join(name))
            .collect();

        let directories = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .filter(|path| path.is_dir())
                .map(measure)
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| ApiError::project_query(project.name.clone(), e.to_string()))?;

        Ok(OutputDescriptor::new(project.name.clone(), directories))
    }
}
