//! Settings view model.
//!
//! Composes persisted settings, the runner multiplexer, and the discoverable
//! settings-file collection, and keeps them current in response to host
//! lifecycle events.

use super::command::DelegateCommand;
use super::manifest::ManifestInfo;
use crate::cleaner::{OutputCleaner, OutputDescriptor};
use crate::config::{DeckConfig, SettingsDefaults};
use crate::error::ApiError;
use crate::observable::{compare_ignore_case, LazyCollection, Observable, Setting};
use crate::runner::{Multiplexer, RunReport, RunRequest, RunnerMultiplexer, TestRunner};
use crate::store::SettingsStore;
use crate::types::{keys, ProjectId};
use crate::workspace::{FilePattern, HostEvent, TestSolution, WorkspaceHost};
use futures::future::{join_all, FutureExt};
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Construction inputs that do not come from collaborators.
#[derive(Debug, Clone)]
pub struct ViewModelOptions {
    pub defaults: SettingsDefaults,
    pub settings_file_pattern: FilePattern,
    pub manifest: ManifestInfo,
}

impl ViewModelOptions {
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            defaults: config.settings.clone(),
            settings_file_pattern: FilePattern::extension(&config.workspace.settings_file_extension),
            manifest: ManifestInfo::from_package(),
        }
    }
}

impl Default for ViewModelOptions {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

/// A project whose output query failed during a size refresh.
#[derive(Debug)]
pub struct ProjectFailure {
    pub project: ProjectId,
    pub error: ApiError,
}

/// Result of one per-project size refresh.
#[derive(Debug, Default)]
pub struct ProjectRefreshReport {
    pub updated: Vec<ProjectId>,
    pub failures: Vec<ProjectFailure>,
}

impl ProjectRefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Both halves of a finished refresh.
#[derive(Debug)]
pub struct RefreshSummary {
    pub settings_files: Arc<Vec<String>>,
    pub projects: ProjectRefreshReport,
}

/// Handles for the two independent tasks spawned by a refresh.
///
/// Dropping the handles detaches the tasks; they still run to completion.
pub struct RefreshHandles {
    pub settings_files: JoinHandle<Arc<Vec<String>>>,
    pub project_sizes: JoinHandle<ProjectRefreshReport>,
}

impl RefreshHandles {
    pub async fn wait(self) -> Result<RefreshSummary, ApiError> {
        let (settings_files, projects) = futures::join!(self.settings_files, self.project_sizes);
        Ok(RefreshSummary {
            settings_files: settings_files.map_err(|e| ApiError::TaskFailed(e.to_string()))?,
            projects: projects.map_err(|e| ApiError::TaskFailed(e.to_string()))?,
        })
    }
}

/// User commands exposed by the view model.
pub struct SettingsCommands {
    pub clean_test_output: DelegateCommand<OutputDescriptor>,
    pub open_path: DelegateCommand<PathBuf>,
    pub clear_test_settings: DelegateCommand<()>,
    pub navigate_to_file: DelegateCommand<PathBuf>,
    pub open_web_site: DelegateCommand<()>,
    pub open_license: DelegateCommand<()>,
    pub open_release_notes: DelegateCommand<()>,
}

/// Settings view model
pub struct SettingsViewModel {
    host: Arc<dyn WorkspaceHost>,
    cleaner: Arc<dyn OutputCleaner>,
    runners: Arc<RunnerMultiplexer>,
    manifest: ManifestInfo,

    exclude_attributes: Setting<String>,
    exclude_files: Setting<String>,
    exclude_directories: Setting<String>,
    filters: Setting<String>,
    show_line_coverage: Setting<bool>,
    show_branch_coverage: Setting<bool>,
    show_exceptions: Setting<bool>,
    show_partial_coverage: Setting<bool>,
    selected_test_settings: Setting<Option<String>>,
    runner_preference: Setting<Option<String>>,

    test_solution: Observable<Option<Arc<TestSolution>>>,
    test_settings_files: LazyCollection<String>,
    commands: SettingsCommands,
}

impl SettingsViewModel {
    pub fn new(
        host: Arc<dyn WorkspaceHost>,
        cleaner: Arc<dyn OutputCleaner>,
        runners: Arc<RunnerMultiplexer>,
        store: Arc<dyn SettingsStore>,
        options: ViewModelOptions,
    ) -> Arc<Self> {
        let defaults = options.defaults;
        let test_settings_files = settings_file_collection(
            Arc::clone(&host),
            options.settings_file_pattern,
        );

        let view_model = Arc::new_cyclic(|weak: &Weak<SettingsViewModel>| Self {
            exclude_attributes: Setting::load(
                keys::EXCLUDE_ATTRIBUTES,
                defaults.exclude_attributes,
                Arc::clone(&store),
            ),
            exclude_files: Setting::load(
                keys::EXCLUDE_FILES,
                defaults.exclude_files,
                Arc::clone(&store),
            ),
            exclude_directories: Setting::load(
                keys::EXCLUDE_DIRECTORIES,
                defaults.exclude_directories,
                Arc::clone(&store),
            ),
            filters: Setting::load(keys::FILTERS, defaults.filters, Arc::clone(&store)),
            show_line_coverage: Setting::load(
                keys::SHOW_LINE_COVERAGE,
                defaults.show_line_coverage,
                Arc::clone(&store),
            ),
            show_branch_coverage: Setting::load(
                keys::SHOW_BRANCH_COVERAGE,
                defaults.show_branch_coverage,
                Arc::clone(&store),
            ),
            show_exceptions: Setting::load(
                keys::SHOW_EXCEPTIONS,
                defaults.show_exceptions,
                Arc::clone(&store),
            ),
            show_partial_coverage: Setting::load(
                keys::SHOW_PARTIAL_COVERAGE,
                defaults.show_partial_coverage,
                Arc::clone(&store),
            ),
            selected_test_settings: Setting::load(
                keys::SELECTED_TEST_SETTINGS,
                None,
                Arc::clone(&store),
            ),
            runner_preference: Setting::load(
                keys::TEST_RUNNER,
                defaults.test_runner,
                Arc::clone(&store),
            ),
            test_solution: Observable::new("test_solution", None),
            test_settings_files,
            commands: build_commands(weak),
            host,
            cleaner,
            runners,
            manifest: options.manifest,
        });

        view_model.wire_command_triggers();
        view_model.restore_runner_preference();
        view_model
    }

    /// Re-evaluate command enablement when the properties it reads change.
    fn wire_command_triggers(&self) {
        let trigger = self.commands.clear_test_settings.trigger();
        self.selected_test_settings
            .subscribe(move |_| trigger.fire());
    }

    fn restore_runner_preference(&self) {
        let Some(preferred) = self.runner_preference.get() else {
            return;
        };
        if let Err(e) = self.runners.set_active(&preferred) {
            warn!(
                runner = %preferred,
                error = %e,
                "Stored runner preference is not registered, keeping default"
            );
        }
    }

    /// Refresh on every host lifecycle event until the host closes its channel
    /// or the view model is dropped.
    pub fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.host.subscribe_events();
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = events.recv().await;
                let Some(view_model) = weak.upgrade() else {
                    break;
                };
                match event {
                    Ok(HostEvent::BuildFinished) => {
                        debug!("Build finished, refreshing settings");
                        view_model.refresh();
                    }
                    Ok(HostEvent::SolutionOpened(solution)) => {
                        debug!(solution = %solution.name, "Solution opened, refreshing settings");
                        view_model.refresh();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed host events, refreshing settings");
                        view_model.refresh();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Start both refresh steps on the runtime and return immediately.
    ///
    /// Overlapping refreshes are not coalesced. A settings-file refresh that
    /// has been overtaken by a later one is discarded; project outputs take
    /// the last write.
    pub fn refresh(self: &Arc<Self>) -> RefreshHandles {
        let files_view = Arc::clone(self);
        let sizes_view = Arc::clone(self);
        RefreshHandles {
            settings_files: tokio::spawn(async move {
                files_view.refresh_test_settings_files().await
            }),
            project_sizes: tokio::spawn(async move { sizes_view.refresh_project_sizes().await }),
        }
    }

    /// Re-derive the settings-file collection from the host.
    pub async fn refresh_test_settings_files(&self) -> Arc<Vec<String>> {
        self.test_settings_files.refresh().await
    }

    /// Query output for every project in a snapshot of the hierarchy.
    ///
    /// Each project's `output` is written as soon as its own query resolves.
    /// A failed query is logged and reported without affecting the others.
    pub async fn refresh_project_sizes(&self) -> ProjectRefreshReport {
        let Some(solution) = self.test_solution.get() else {
            debug!("No test solution loaded, skipping project size refresh");
            return ProjectRefreshReport::default();
        };

        let projects = solution.projects();
        let queries = projects.into_iter().map(|node| {
            let cleaner = Arc::clone(&self.cleaner);
            async move {
                match cleaner.get_output_files(node.project()).await {
                    Ok(output) => {
                        debug!(
                            project = %node.name(),
                            bytes = output.total_size(),
                            "Project output measured"
                        );
                        node.set_output(Some(output));
                        Ok(node.name().to_string())
                    }
                    Err(error) => {
                        warn!(project = %node.name(), error = %error, "Project output query failed");
                        Err(ProjectFailure {
                            project: node.name().to_string(),
                            error,
                        })
                    }
                }
            }
        });

        let mut report = ProjectRefreshReport::default();
        for result in join_all(queries).await {
            match result {
                Ok(project) => report.updated.push(project),
                Err(failure) => report.failures.push(failure),
            }
        }
        info!(
            updated = report.updated.len(),
            failed = report.failures.len(),
            "Project sizes refreshed"
        );
        report
    }

    /// Clean `target`, then re-measure once the clean has completed.
    pub async fn clean_test_output(
        &self,
        target: &OutputDescriptor,
    ) -> Result<ProjectRefreshReport, ApiError> {
        self.cleaner.clean_output(target).await?;
        Ok(self.refresh_project_sizes().await)
    }

    /// Run tests for `project` on whichever backend is active.
    pub async fn run_tests(&self, project: &str) -> Result<RunReport, ApiError> {
        let solution = self.test_solution.get().ok_or_else(|| {
            ApiError::CollaboratorUnavailable("No test solution loaded".to_string())
        })?;
        let node = solution.find_project(project).ok_or_else(|| {
            ApiError::CollaboratorUnavailable(format!("Project not found: {}", project))
        })?;

        let request = RunRequest {
            project_name: node.name().to_string(),
            project_root: node.project().root.clone(),
            filters: self.filters.get(),
            settings_file: self.selected_test_settings.get().map(PathBuf::from),
            exclude_attributes: self.exclude_attributes.get(),
            exclude_files: self.exclude_files.get(),
            exclude_directories: self.exclude_directories.get(),
        };
        let runner: &dyn TestRunner = &*self.runners;
        runner.run(&request).await
    }

    pub fn test_runners(&self) -> Vec<String> {
        self.runners.implementations()
    }

    pub fn selected_test_runner(&self) -> Option<String> {
        self.runners.active_name()
    }

    /// Switch the active backend and remember the choice.
    pub async fn set_selected_test_runner(&self, name: &str) -> Result<(), ApiError> {
        if !self.runners.contains(name) {
            return Err(ApiError::UnknownImplementation(name.to_string()));
        }
        self.runner_preference.set(Some(name.to_string())).await?;
        self.runners.set_active(name)
    }

    pub fn test_settings_files(&self) -> &LazyCollection<String> {
        &self.test_settings_files
    }

    pub fn selected_test_settings(&self) -> &Setting<Option<String>> {
        &self.selected_test_settings
    }

    pub fn test_solution(&self) -> &Observable<Option<Arc<TestSolution>>> {
        &self.test_solution
    }

    pub fn set_test_solution(&self, solution: Option<Arc<TestSolution>>) {
        self.test_solution.set(solution);
    }

    pub fn exclude_attributes(&self) -> &Setting<String> {
        &self.exclude_attributes
    }

    pub fn exclude_files(&self) -> &Setting<String> {
        &self.exclude_files
    }

    pub fn exclude_directories(&self) -> &Setting<String> {
        &self.exclude_directories
    }

    pub fn filters(&self) -> &Setting<String> {
        &self.filters
    }

    pub fn show_line_coverage(&self) -> &Setting<bool> {
        &self.show_line_coverage
    }

    pub fn show_branch_coverage(&self) -> &Setting<bool> {
        &self.show_branch_coverage
    }

    pub fn show_exceptions(&self) -> &Setting<bool> {
        &self.show_exceptions
    }

    pub fn show_partial_coverage(&self) -> &Setting<bool> {
        &self.show_partial_coverage
    }

    /// Text setting by key, for generic editors such as the CLI.
    pub fn text_setting(&self, key: &str) -> Option<&Setting<String>> {
        match key {
            keys::EXCLUDE_ATTRIBUTES => Some(&self.exclude_attributes),
            keys::EXCLUDE_FILES => Some(&self.exclude_files),
            keys::EXCLUDE_DIRECTORIES => Some(&self.exclude_directories),
            keys::FILTERS => Some(&self.filters),
            _ => None,
        }
    }

    /// Display toggle by key.
    pub fn toggle_setting(&self, key: &str) -> Option<&Setting<bool>> {
        match key {
            keys::SHOW_LINE_COVERAGE => Some(&self.show_line_coverage),
            keys::SHOW_BRANCH_COVERAGE => Some(&self.show_branch_coverage),
            keys::SHOW_EXCEPTIONS => Some(&self.show_exceptions),
            keys::SHOW_PARTIAL_COVERAGE => Some(&self.show_partial_coverage),
            _ => None,
        }
    }

    pub fn manifest(&self) -> &ManifestInfo {
        &self.manifest
    }

    pub fn commands(&self) -> &SettingsCommands {
        &self.commands
    }
}

fn settings_file_collection(
    host: Arc<dyn WorkspaceHost>,
    pattern: FilePattern,
) -> LazyCollection<String> {
    LazyCollection::new(
        Box::new(move || {
            let host = Arc::clone(&host);
            let pattern = pattern.clone();
            async move {
                match host.find_files(&pattern).await {
                    Ok(paths) => paths
                        .into_iter()
                        .map(|path| path.to_string_lossy().into_owned())
                        .collect(),
                    Err(e) => {
                        debug!(error = %e, "Settings files unavailable");
                        Vec::new()
                    }
                }
            }
            .boxed()
        }),
        |a: &String, b: &String| compare_ignore_case(a, b),
    )
}

fn upgrade(weak: &Weak<SettingsViewModel>) -> Result<Arc<SettingsViewModel>, ApiError> {
    weak.upgrade()
        .ok_or_else(|| ApiError::CollaboratorUnavailable("Settings view model dropped".to_string()))
}

fn build_commands(weak: &Weak<SettingsViewModel>) -> SettingsCommands {
    let clean = weak.clone();
    let open_path = weak.clone();
    let clear = weak.clone();
    let clear_enabled = weak.clone();
    let navigate = weak.clone();
    let web_site = weak.clone();
    let license = weak.clone();
    let release_notes = weak.clone();

    SettingsCommands {
        clean_test_output: DelegateCommand::new("clean_test_output", move |target: OutputDescriptor| {
            let view_model = upgrade(&clean);
            async move {
                view_model?.clean_test_output(&target).await?;
                Ok(())
            }
        }),
        open_path: DelegateCommand::new("open_path", move |path: PathBuf| {
            let result = upgrade(&open_path).and_then(|vm| vm.host.open_path_in_explorer(&path));
            async move { result }
        }),
        clear_test_settings: DelegateCommand::new("clear_test_settings", move |_: ()| {
            let view_model = upgrade(&clear);
            async move { view_model?.selected_test_settings.set(None).await }
        })
        .with_can_execute(move |_| {
            clear_enabled
                .upgrade()
                .map(|vm| vm.selected_test_settings.with(Option::is_some))
                .unwrap_or(false)
        }),
        navigate_to_file: DelegateCommand::new("navigate_to_file", move |path: PathBuf| {
            let result = upgrade(&navigate).and_then(|vm| vm.host.navigate_to_file(&path));
            async move { result }
        }),
        open_web_site: DelegateCommand::new("open_web_site", move |_: ()| {
            let result = upgrade(&web_site).and_then(|vm| vm.host.open_url(&vm.manifest.website));
            async move { result }
        }),
        open_license: DelegateCommand::new("open_license", move |_: ()| {
            let result = upgrade(&license).and_then(|vm| {
                vm.host
                    .show_text(&vm.manifest.license_title(), &vm.manifest.license)
            });
            async move { result }
        }),
        open_release_notes: DelegateCommand::new("open_release_notes", move |_: ()| {
            let result = upgrade(&release_notes).and_then(|vm| {
                vm.host
                    .show_text(&vm.manifest.release_notes_title(), &vm.manifest.release_notes)
            });
            async move { result }
        }),
    }
}
