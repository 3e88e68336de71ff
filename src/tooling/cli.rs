//! CLI Tooling
//!
//! Command-line front end over the settings view model. Every command runs
//! against the workspace given by `--workspace` and its layered configuration.

use crate::cleaner::{format_size, FsOutputCleaner};
use crate::config::{ConfigLoader, DeckConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::runner::{ProcessRunner, RunReport, RunnerMultiplexer, TestRunner};
use crate::settings::{ProjectRefreshReport, SettingsViewModel, ViewModelOptions};
use crate::store::SledSettingsStore;
use crate::types::keys;
use crate::workspace::{FsWorkspaceHost, TestSolution};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Testdeck CLI - test settings, runner selection, and output housekeeping
#[derive(Parser)]
#[command(name = "testdeck")]
#[command(about = "Manage test settings, runners, and test output for a workspace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply logging flags on top of the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "file+stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingCommands,
    },
    /// List, select, or run test runners
    Runners {
        #[command(subcommand)]
        command: RunnerCommands,
    },
    /// List discovered test settings files, or change the selection
    Files {
        #[command(subcommand)]
        command: Option<FileCommands>,
    },
    /// Measure test output for every project
    Outputs {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a project's test output, then measure again
    Clean {
        /// Project name
        project: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show product information
    About {
        #[command(subcommand)]
        command: Option<AboutCommands>,
    },
}

#[derive(Subcommand)]
pub enum SettingCommands {
    /// List every setting with its current value
    List,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

#[derive(Subcommand)]
pub enum RunnerCommands {
    /// List registered runners, marking the active one
    List,
    /// Make a runner active and remember the choice
    Select { name: String },
    /// Run a project's tests on the active runner
    Run { project: String },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// Select a discovered settings file
    Select { path: PathBuf },
    /// Clear the selected settings file
    Clear,
    /// Open a settings file in the editor
    Open { path: PathBuf },
}

#[derive(Subcommand)]
pub enum AboutCommands {
    /// Print the license text
    License,
    /// Print the release notes
    ReleaseNotes,
    /// Open the project web site
    Web,
}

/// CLI context
pub struct CliContext {
    workspace_root: PathBuf,
    view_model: Arc<SettingsViewModel>,
}

impl CliContext {
    /// Load configuration for a workspace, or from an explicit file.
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<DeckConfig, ApiError> {
        match config_path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(workspace_root),
        }
    }

    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = Self::load_config(&workspace_root, config_path.as_deref())?;
        Self::with_config(workspace_root, config)
    }

    /// Wire collaborators from an already-loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: DeckConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_path(&workspace_root)?;
        let store = Arc::new(SledSettingsStore::open(&store_path)?);

        let host = Arc::new(FsWorkspaceHost::new());
        let solution_info = host.open_solution(&workspace_root)?;
        let solution =
            TestSolution::discover(&solution_info.root, &config.workspace.project_markers)?;

        let runners = RunnerMultiplexer::new();
        for (name, runner_config) in &config.runners {
            let runner: Arc<dyn TestRunner> =
                Arc::new(ProcessRunner::new(name.clone(), runner_config.clone()));
            runners.register(name.clone(), runner)?;
        }

        let view_model = SettingsViewModel::new(
            host,
            Arc::new(FsOutputCleaner::new(config.cleaner.clone())),
            Arc::new(runners),
            store,
            ViewModelOptions::from_config(&config),
        );
        view_model.set_test_solution(Some(Arc::new(solution)));

        info!(
            workspace = %solution_info.root.display(),
            store = %store_path.display(),
            "CLI context ready"
        );
        Ok(Self {
            workspace_root: solution_info.root,
            view_model,
        })
    }

    pub fn view_model(&self) -> &Arc<SettingsViewModel> {
        &self.view_model
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Settings { command } => self.handle_settings(command).await,
            Commands::Runners { command } => self.handle_runners(command).await,
            Commands::Files { command } => self.handle_files(command.as_ref()).await,
            Commands::Outputs { format } => self.handle_outputs(format).await,
            Commands::Clean { project, yes } => self.handle_clean(project, *yes).await,
            Commands::About { command } => self.handle_about(command.as_ref()).await,
        }
    }

    async fn handle_settings(&self, command: &SettingCommands) -> Result<String, ApiError> {
        match command {
            SettingCommands::List => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Key", "Value"]);
                for key in all_setting_keys() {
                    table.add_row(vec![key.to_string(), self.setting_value(key)?]);
                }
                Ok(table.to_string())
            }
            SettingCommands::Get { key } => self.setting_value(key),
            SettingCommands::Set { key, value } => {
                let vm = &self.view_model;
                if let Some(setting) = vm.text_setting(key) {
                    setting.set(value.clone()).await?;
                } else if let Some(setting) = vm.toggle_setting(key) {
                    setting.set(parse_toggle(value)?).await?;
                } else if key == keys::SELECTED_TEST_SETTINGS {
                    let selection = (!value.is_empty()).then(|| value.clone());
                    vm.selected_test_settings().set(selection).await?;
                } else if key == keys::TEST_RUNNER {
                    vm.set_selected_test_runner(value).await?;
                } else {
                    return Err(unknown_key(key));
                }
                Ok(format!("{} = {}", key.bold(), self.setting_value(key)?))
            }
        }
    }

    fn setting_value(&self, key: &str) -> Result<String, ApiError> {
        let vm = &self.view_model;
        if let Some(setting) = vm.text_setting(key) {
            return Ok(setting.get());
        }
        if let Some(setting) = vm.toggle_setting(key) {
            return Ok(setting.get().to_string());
        }
        match key {
            keys::SELECTED_TEST_SETTINGS => Ok(vm
                .selected_test_settings()
                .get()
                .unwrap_or_else(|| "-".to_string())),
            keys::TEST_RUNNER => Ok(vm.selected_test_runner().unwrap_or_else(|| "-".to_string())),
            _ => Err(unknown_key(key)),
        }
    }

    async fn handle_runners(&self, command: &RunnerCommands) -> Result<String, ApiError> {
        let vm = &self.view_model;
        match command {
            RunnerCommands::List => {
                let runners = vm.test_runners();
                if runners.is_empty() {
                    return Ok("No test runners configured".to_string());
                }
                let active = vm.selected_test_runner();
                let lines: Vec<String> = runners
                    .iter()
                    .map(|name| {
                        if active.as_deref() == Some(name.as_str()) {
                            format!("* {}", name.green())
                        } else {
                            format!("  {}", name)
                        }
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            RunnerCommands::Select { name } => {
                vm.set_selected_test_runner(name).await?;
                Ok(format!("Active test runner: {}", name))
            }
            RunnerCommands::Run { project } => {
                let report = vm.run_tests(project).await?;
                Ok(format_run_report(&report))
            }
        }
    }

    async fn handle_files(&self, command: Option<&FileCommands>) -> Result<String, ApiError> {
        let vm = &self.view_model;
        match command {
            None => {
                let files = vm.refresh_test_settings_files().await;
                if files.is_empty() {
                    return Ok("No test settings files found".to_string());
                }
                let selected = vm.selected_test_settings().get();
                let lines: Vec<String> = files
                    .iter()
                    .map(|file| {
                        if selected.as_deref() == Some(file.as_str()) {
                            format!("* {}", file.green())
                        } else {
                            format!("  {}", file)
                        }
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            Some(FileCommands::Select { path }) => {
                vm.refresh_test_settings_files().await;
                let candidate = self.resolve(path).to_string_lossy().into_owned();
                if !vm.test_settings_files().contains(&candidate) {
                    return Err(ApiError::ConfigError(format!(
                        "Not a discovered test settings file: {}",
                        path.display()
                    )));
                }
                vm.selected_test_settings().set(Some(candidate.clone())).await?;
                Ok(format!("Selected test settings: {}", candidate))
            }
            Some(FileCommands::Clear) => {
                let command = &vm.commands().clear_test_settings;
                if !command.can_execute(&()) {
                    return Ok("No test settings selected".to_string());
                }
                command.execute(()).await?;
                Ok("Test settings selection cleared".to_string())
            }
            Some(FileCommands::Open { path }) => {
                let path = self.resolve(path);
                vm.commands().navigate_to_file.execute(path.clone()).await?;
                Ok(format!("Opened {}", path.display()))
            }
        }
    }

    async fn handle_outputs(&self, format: &str) -> Result<String, ApiError> {
        let report = self.view_model.refresh_project_sizes().await;
        let solution = self.solution()?;

        if format == "json" {
            let rows: Vec<serde_json::Value> = solution
                .projects()
                .iter()
                .map(|node| {
                    serde_json::json!({
                        "project": node.name(),
                        "output": node.output(),
                        "error": failure_message(&report, node.name()),
                    })
                })
                .collect();
            return serde_json::to_string_pretty(&rows).map_err(|e| {
                ApiError::StorageError(crate::error::StorageError::Serialization(e.to_string()))
            });
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Project", "Directories", "Files", "Size"]);
        for node in solution.projects() {
            let row = match (node.output(), failure_message(&report, node.name())) {
                (_, Some(error)) => vec![
                    node.name().to_string(),
                    format!("error: {}", error),
                    "-".to_string(),
                    "-".to_string(),
                ],
                (Some(output), None) => vec![
                    node.name().to_string(),
                    output.directories.len().to_string(),
                    output.file_count().to_string(),
                    format_size(output.total_size()),
                ],
                (None, None) => vec![
                    node.name().to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ],
            };
            table.add_row(row);
        }
        Ok(table.to_string())
    }

    async fn handle_clean(&self, project: &str, yes: bool) -> Result<String, ApiError> {
        let solution = self.solution()?;
        let node = solution.find_project(project).ok_or_else(|| {
            ApiError::CollaboratorUnavailable(format!("Project not found: {}", project))
        })?;

        let report = self.view_model.refresh_project_sizes().await;
        if let Some(error) = failure_message(&report, project) {
            return Err(ApiError::project_query(project, error));
        }
        let target = match node.output() {
            Some(output) if !output.is_empty() => output,
            _ => return Ok(format!("Nothing to clean for {}", project)),
        };

        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete {} of test output in {}?",
                    format_size(target.total_size()),
                    project
                ))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Clean cancelled".to_string());
            }
        }

        let freed = target.total_size();
        self.view_model
            .commands()
            .clean_test_output
            .execute(target)
            .await?;
        let remaining = node.output().map(|o| o.total_size()).unwrap_or(0);
        Ok(format!(
            "Cleaned {}: freed {}, {} remaining",
            project,
            format_size(freed),
            format_size(remaining)
        ))
    }

    async fn handle_about(&self, command: Option<&AboutCommands>) -> Result<String, ApiError> {
        let vm = &self.view_model;
        let commands = vm.commands();
        match command {
            None => {
                let manifest = vm.manifest();
                Ok(format!(
                    "{} {}\n{}",
                    manifest.name.bold(),
                    manifest.version,
                    manifest.website
                ))
            }
            Some(AboutCommands::License) => {
                commands.open_license.execute(()).await?;
                Ok(String::new())
            }
            Some(AboutCommands::ReleaseNotes) => {
                commands.open_release_notes.execute(()).await?;
                Ok(String::new())
            }
            Some(AboutCommands::Web) => {
                commands.open_web_site.execute(()).await?;
                Ok(format!("Opened {}", vm.manifest().website))
            }
        }
    }

    fn solution(&self) -> Result<Arc<TestSolution>, ApiError> {
        self.view_model
            .test_solution()
            .get()
            .ok_or_else(|| ApiError::CollaboratorUnavailable("No test solution loaded".to_string()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };
        dunce::canonicalize(&joined).unwrap_or(joined)
    }
}

fn all_setting_keys() -> impl Iterator<Item = &'static str> {
    keys::TEXT_KEYS
        .into_iter()
        .chain(keys::TOGGLE_KEYS)
        .chain([keys::SELECTED_TEST_SETTINGS, keys::TEST_RUNNER])
}

fn unknown_key(key: &str) -> ApiError {
    ApiError::ConfigError(format!(
        "Unknown setting: {} (expected one of: {})",
        key,
        all_setting_keys().collect::<Vec<_>>().join(", ")
    ))
}

fn parse_toggle(value: &str) -> Result<bool, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ApiError::ConfigError(format!(
            "Invalid toggle value: {} (expected true or false)",
            value
        ))),
    }
}

fn failure_message(report: &ProjectRefreshReport, project: &str) -> Option<String> {
    report
        .failures
        .iter()
        .find(|failure| failure.project == project)
        .map(|failure| failure.error.to_string())
}

fn format_run_report(report: &RunReport) -> String {
    let status = if report.success {
        "passed".green().to_string()
    } else {
        "failed".red().to_string()
    };
    let exit_code = report
        .exit_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "signal".to_string());
    format!(
        "{} {} on {} (exit {}, {} ms)",
        report.project_name, status, report.runner, exit_code, report.duration_ms
    )
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Settings { .. } => "settings",
        Commands::Runners { .. } => "runners",
        Commands::Files { .. } => "files",
        Commands::Outputs { .. } => "outputs",
        Commands::Clean { .. } => "clean",
        Commands::About { .. } => "about",
    }
}
