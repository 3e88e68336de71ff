//! Editor/workspace host contract.

use crate::error::ApiError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// The loaded solution, as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionInfo {
    pub name: String,
    pub root: PathBuf,
}

/// Lifecycle notifications published by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    BuildFinished,
    SolutionOpened(SolutionInfo),
}

/// Case-insensitive file extension match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    extension: String,
}

impl FilePattern {
    /// Match files whose extension equals `extension` (no leading dot).
    pub fn extension(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase() == self.extension)
            .unwrap_or(false)
    }
}

/// Editor/workspace host
///
/// `find_files` fails with [`ApiError::CollaboratorUnavailable`] when no
/// solution is loaded.
#[async_trait]
pub trait WorkspaceHost: Send + Sync {
    fn solution(&self) -> Option<SolutionInfo>;

    async fn find_files(&self, pattern: &FilePattern) -> Result<Vec<PathBuf>, ApiError>;

    /// New receiver for lifecycle events.
    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent>;

    fn open_path_in_explorer(&self, path: &Path) -> Result<(), ApiError>;

    fn navigate_to_file(&self, path: &Path) -> Result<(), ApiError>;

    fn open_url(&self, url: &str) -> Result<(), ApiError>;

    /// Present a block of text to the user under `title`.
    fn show_text(&self, title: &str, body: &str) -> Result<(), ApiError>;
}
