//! Test hierarchy: solution → projects, with a per-project output annotation.
//!
//! The tree belongs to whoever discovered it. The coordination layer only reads
//! project snapshots and writes each node's `output`.

use crate::cleaner::OutputDescriptor;
use crate::error::ApiError;
use crate::observable::{Observable, SubscriptionId};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// A project that owns tests.
///
/// `name` is the project's identity inside its solution. Discovered projects
/// are named by their root-relative path (`apps/core`), so two directories
/// with the same leaf name stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestProject {
    pub name: String,
    pub root: PathBuf,
}

impl TestProject {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// Project node in the hierarchy.
pub struct TestProjectNode {
    project: TestProject,
    output: Observable<Option<OutputDescriptor>>,
}

impl TestProjectNode {
    pub fn new(project: TestProject) -> Self {
        Self {
            project,
            output: Observable::new("output", None),
        }
    }

    pub fn project(&self) -> &TestProject {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Last measured output, if any.
    pub fn output(&self) -> Option<OutputDescriptor> {
        self.output.get()
    }

    pub fn set_output(&self, output: Option<OutputDescriptor>) {
        self.output.set(output);
    }

    pub fn subscribe_output<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Option<OutputDescriptor>) + Send + Sync + 'static,
    {
        self.output.subscribe(callback)
    }
}

/// Root of the hierarchy.
pub struct TestSolution {
    name: String,
    root: PathBuf,
    projects: RwLock<Vec<Arc<TestProjectNode>>>,
}

impl TestSolution {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            projects: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_project(&self, project: TestProject) -> Arc<TestProjectNode> {
        let node = Arc::new(TestProjectNode::new(project));
        self.projects.write().push(Arc::clone(&node));
        node
    }

    pub fn remove_project(&self, name: &str) -> Option<Arc<TestProjectNode>> {
        let mut projects = self.projects.write();
        let index = projects.iter().position(|node| node.name() == name)?;
        Some(projects.remove(index))
    }

    /// Point-in-time copy of the project nodes.
    pub fn projects(&self) -> Vec<Arc<TestProjectNode>> {
        self.projects.read().clone()
    }

    pub fn find_project(&self, name: &str) -> Option<Arc<TestProjectNode>> {
        self.projects
            .read()
            .iter()
            .find(|node| node.name() == name)
            .cloned()
    }

    pub fn project_count(&self) -> usize {
        self.projects.read().len()
    }

    /// Build a solution from `root`: every directory up to two levels deep that
    /// contains one of `markers` becomes a project, named by its path relative
    /// to `root` (`.` for the root itself).
    pub fn discover(root: &Path, markers: &[String]) -> Result<Self, ApiError> {
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("workspace")
            .to_string();
        let solution = Self::new(name, root);

        let walker = WalkDir::new(root)
            .min_depth(0)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry.path(), root));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry during discovery");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            if markers.iter().any(|marker| dir.join(marker).is_file()) {
                let project_name = project_id(root, dir);
                solution.add_project(TestProject::new(project_name, dir));
            }
        }

        debug!(
            root = %root.display(),
            projects = solution.project_count(),
            "Discovered test solution"
        );
        Ok(solution)
    }
}

fn project_id(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    if path == root {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n == "target" || n == "node_modules")
        .unwrap_or(false)
}
