//! Configuration
//!
//! Layered configuration: built-in defaults, global file, workspace file, and
//! `TESTDECK__*` environment overrides, merged with the `config` crate.

mod facade;
mod merge;
mod paths;
mod sources;
mod workspace;

use crate::cleaner::CleanerConfig;
use crate::logging::LoggingConfig;
use crate::runner::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

fn default_exclude_attributes() -> String {
    "*.ExcludeFromCodeCoverage*".to_string()
}

fn default_true() -> bool {
    true
}

/// Defaults for every persisted setting, used until a value is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDefaults {
    #[serde(default = "default_exclude_attributes")]
    pub exclude_attributes: String,
    #[serde(default)]
    pub exclude_files: String,
    #[serde(default)]
    pub exclude_directories: String,
    #[serde(default)]
    pub filters: String,
    #[serde(default = "default_true")]
    pub show_line_coverage: bool,
    #[serde(default = "default_true")]
    pub show_branch_coverage: bool,
    #[serde(default = "default_true")]
    pub show_exceptions: bool,
    #[serde(default = "default_true")]
    pub show_partial_coverage: bool,
    /// Runner selected when no preference has been stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_runner: Option<String>,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            exclude_attributes: default_exclude_attributes(),
            exclude_files: String::new(),
            exclude_directories: String::new(),
            filters: String::new(),
            show_line_coverage: true,
            show_branch_coverage: true,
            show_exceptions: true,
            show_partial_coverage: true,
            test_runner: None,
        }
    }
}

fn default_project_markers() -> Vec<String> {
    vec!["Cargo.toml".to_string()]
}

fn default_settings_file_extension() -> String {
    "testsettings".to_string()
}

/// Workspace discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// A directory containing one of these files is a test project
    #[serde(default = "default_project_markers")]
    pub project_markers: Vec<String>,
    /// Extension of discoverable test settings files
    #[serde(default = "default_settings_file_extension")]
    pub settings_file_extension: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            project_markers: default_project_markers(),
            settings_file_extension: default_settings_file_extension(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub settings: SettingsDefaults,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Test runner backends by name
    #[serde(default)]
    pub runners: BTreeMap<String, RunnerConfig>,
    #[serde(default)]
    pub cleaner: CleanerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}
