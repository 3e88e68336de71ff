//! Settings coordination layer: bound settings, the discoverable settings-file
//! collection, runner selection, and user commands.

mod command;
mod manifest;
mod view_model;

pub use command::{CommandTrigger, DelegateCommand};
pub use manifest::ManifestInfo;
pub use view_model::{
    ProjectFailure, ProjectRefreshReport, RefreshHandles, RefreshSummary, SettingsCommands,
    SettingsViewModel, ViewModelOptions,
};
