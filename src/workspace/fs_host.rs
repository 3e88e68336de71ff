//! Filesystem-backed workspace host.

use super::host::{FilePattern, HostEvent, SolutionInfo, WorkspaceHost};
use crate::error::{ApiError, StorageError};
use async_trait::async_trait;
use owo_colors::OwoColorize;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const EVENT_CAPACITY: usize = 64;

/// Directory names never descended into while enumerating files.
const SKIPPED_DIRS: [&str; 4] = [".git", "target", "node_modules", ".testdeck"];

/// Host over a directory tree, with lifecycle events raised explicitly.
pub struct FsWorkspaceHost {
    solution: RwLock<Option<SolutionInfo>>,
    events: broadcast::Sender<HostEvent>,
}

impl FsWorkspaceHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            solution: RwLock::new(None),
            events,
        }
    }

    /// Load the solution rooted at `root` and publish `SolutionOpened`.
    pub fn open_solution(&self, root: &Path) -> Result<SolutionInfo, ApiError> {
        let root = dunce::canonicalize(root).map_err(|e| {
            ApiError::StorageError(StorageError::InvalidPath(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        let info = SolutionInfo {
            name: root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("workspace")
                .to_string(),
            root,
        };
        *self.solution.write() = Some(info.clone());
        info!(solution = %info.name, root = %info.root.display(), "Solution opened");
        self.publish(HostEvent::SolutionOpened(info.clone()));
        Ok(info)
    }

    pub fn close_solution(&self) {
        *self.solution.write() = None;
    }

    /// Publish `BuildFinished`.
    pub fn notify_build_finished(&self) {
        debug!("Build finished");
        self.publish(HostEvent::BuildFinished);
    }

    fn publish(&self, event: HostEvent) {
        // No receivers is not an error: nobody is attached yet.
        let _ = self.events.send(event);
    }
}

impl Default for FsWorkspaceHost {
    fn default() -> Self {
        Self::new()
    }
}

fn scan(root: &Path, pattern: &FilePattern) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry
                    .file_name()
                    .to_str()
                    .map(|name| !SKIPPED_DIRS.contains(&name))
                    .unwrap_or(true)
        })
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && pattern.matches(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Start `program` detached from the caller. The child is reaped by a
/// runtime task whose handle resolves to the exit status.
fn launch(program: &str, argument: &str) -> Result<JoinHandle<Option<ExitStatus>>, ApiError> {
    let handle = Handle::try_current().map_err(|_| {
        ApiError::CollaboratorUnavailable(format!("Cannot launch {} without a runtime", program))
    })?;
    let _entered = handle.enter();
    let mut child = Command::new(program).arg(argument).spawn().map_err(|e| {
        ApiError::CollaboratorUnavailable(format!("Failed to launch {}: {}", program, e))
    })?;

    let program = program.to_string();
    Ok(handle.spawn(async move {
        match child.wait().await {
            Ok(status) => {
                debug!(program = %program, %status, "Launched process exited");
                Some(status)
            }
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to wait for launched process");
                None
            }
        }
    }))
}

fn system_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

#[async_trait]
impl WorkspaceHost for FsWorkspaceHost {
    fn solution(&self) -> Option<SolutionInfo> {
        self.solution.read().clone()
    }

    async fn find_files(&self, pattern: &FilePattern) -> Result<Vec<PathBuf>, ApiError> {
        let solution = self.solution().ok_or_else(|| {
            ApiError::CollaboratorUnavailable("No solution loaded".to_string())
        })?;
        let pattern = pattern.clone();
        tokio::task::spawn_blocking(move || scan(&solution.root, &pattern))
            .await
            .map_err(|e| ApiError::TaskFailed(format!("File enumeration failed: {}", e)))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    fn open_path_in_explorer(&self, path: &Path) -> Result<(), ApiError> {
        launch(system_opener(), &path.to_string_lossy()).map(drop)
    }

    fn navigate_to_file(&self, path: &Path) -> Result<(), ApiError> {
        let editor = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| system_opener().to_string());
        launch(&editor, &path.to_string_lossy()).map(drop)
    }

    fn open_url(&self, url: &str) -> Result<(), ApiError> {
        launch(system_opener(), url).map(drop)
    }

    fn show_text(&self, title: &str, body: &str) -> Result<(), ApiError> {
        println!("{}\n\n{}", title.bold(), body);
        Ok(())
    }
}
