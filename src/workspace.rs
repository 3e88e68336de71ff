//! Workspace domain: the editor/workspace host contract, the test hierarchy it
//! exposes, and a filesystem-backed host.

mod fs_host;
mod hierarchy;
mod host;

pub use fs_host::FsWorkspaceHost;
pub use hierarchy::{TestProject, TestProjectNode, TestSolution};
pub use host::{FilePattern, HostEvent, SolutionInfo, WorkspaceHost};
