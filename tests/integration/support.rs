use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testdeck::cleaner::{OutputCleaner, OutputDescriptor, OutputDirectory};
use testdeck::error::{ApiError, StorageError};
use testdeck::runner::{RunReport, RunRequest, RunnerMultiplexer, TestRunner};
use testdeck::settings::{SettingsViewModel, ViewModelOptions};
use testdeck::store::{MemorySettingsStore, SettingsStore};
use testdeck::workspace::{
    FilePattern, HostEvent, SolutionInfo, TestProject, TestSolution, WorkspaceHost,
};
use tokio::sync::{broadcast, watch};

/// Host whose solution, files, and events are driven by the test.
pub struct FakeHost {
    solution: Mutex<Option<SolutionInfo>>,
    files: Mutex<Vec<PathBuf>>,
    events: broadcast::Sender<HostEvent>,
    pub actions: Mutex<Vec<String>>,
    pub shown: Mutex<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            solution: Mutex::new(None),
            files: Mutex::new(Vec::new()),
            events,
            actions: Mutex::new(Vec::new()),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn with_solution(files: &[&str]) -> Arc<Self> {
        let host = Self::new();
        host.load(SolutionInfo {
            name: "demo".to_string(),
            root: PathBuf::from("/work/demo"),
        });
        host.set_files(files);
        host
    }

    pub fn load(&self, info: SolutionInfo) {
        *self.solution.lock() = Some(info);
    }

    pub fn set_files(&self, files: &[&str]) {
        *self.files.lock() = files.iter().map(PathBuf::from).collect();
    }

    pub fn emit(&self, event: HostEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WorkspaceHost for FakeHost {
    fn solution(&self) -> Option<SolutionInfo> {
        self.solution.lock().clone()
    }

    async fn find_files(&self, pattern: &FilePattern) -> Result<Vec<PathBuf>, ApiError> {
        if self.solution().is_none() {
            return Err(ApiError::CollaboratorUnavailable(
                "No solution loaded".to_string(),
            ));
        }
        Ok(self
            .files
            .lock()
            .iter()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    fn open_path_in_explorer(&self, path: &Path) -> Result<(), ApiError> {
        self.actions.lock().push(format!("explore:{}", path.display()));
        Ok(())
    }

    fn navigate_to_file(&self, path: &Path) -> Result<(), ApiError> {
        self.actions.lock().push(format!("navigate:{}", path.display()));
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), ApiError> {
        self.actions.lock().push(format!("url:{}", url));
        Ok(())
    }

    fn show_text(&self, title: &str, body: &str) -> Result<(), ApiError> {
        self.shown.lock().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Cleaner over an in-memory size table, with per-project failure injection.
/// Queries wait while the gate is closed.
pub struct FakeCleaner {
    sizes: Mutex<HashMap<String, u64>>,
    failing: Mutex<HashSet<String>>,
    gate: watch::Sender<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCleaner {
    pub fn new() -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            sizes: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            gate,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn set_size(&self, project: &str, bytes: u64) {
        self.sizes.lock().insert(project.to_string(), bytes);
    }

    pub fn fail(&self, project: &str) {
        self.failing.lock().insert(project.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OutputCleaner for FakeCleaner {
    async fn clean_output(&self, target: &OutputDescriptor) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        self.sizes.lock().insert(target.project.clone(), 0);
        self.calls.lock().push(format!("clean:{}", target.project));
        Ok(())
    }

    async fn get_output_files(&self, project: &TestProject) -> Result<OutputDescriptor, ApiError> {
        self.calls.lock().push(format!("query:{}", project.name));
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        tokio::task::yield_now().await;
        if self.failing.lock().contains(&project.name) {
            return Err(ApiError::project_query(project.name.clone(), "injected failure"));
        }
        let bytes = self.sizes.lock().get(&project.name).copied().unwrap_or(0);
        Ok(OutputDescriptor::new(
            project.name.clone(),
            vec![OutputDirectory {
                path: project.root.join("TestResults"),
                size_bytes: bytes,
                file_count: u64::from(bytes > 0),
            }],
        ))
    }
}

/// Runner that records every request it receives.
pub struct RecordingRunner {
    name: String,
    pub requests: Mutex<Vec<RunRequest>>,
}

impl RecordingRunner {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TestRunner for RecordingRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunReport, ApiError> {
        self.requests.lock().push(request.clone());
        Ok(RunReport {
            runner: self.name.clone(),
            project_name: request.project_name.clone(),
            exit_code: Some(0),
            success: true,
            duration_ms: 0,
        })
    }
}

/// Store that rejects every write.
#[derive(Default)]
pub struct RejectingStore;

impl SettingsStore for RejectingStore {
    fn read(&self, _key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &serde_json::Value) -> Result<(), StorageError> {
        Err(StorageError::Database("disk full".to_string()))
    }
}

pub fn runners(names: &[&str]) -> (Arc<RunnerMultiplexer>, Vec<Arc<RecordingRunner>>) {
    let multiplexer = RunnerMultiplexer::new();
    let mut recorders = Vec::new();
    for name in names {
        let runner = RecordingRunner::new(name);
        let implementation: Arc<dyn TestRunner> = runner.clone();
        multiplexer.register(*name, implementation).unwrap();
        recorders.push(runner);
    }
    (Arc::new(multiplexer), recorders)
}

pub fn solution(projects: &[&str]) -> Arc<TestSolution> {
    let solution = TestSolution::new("demo", "/work/demo");
    for name in projects {
        solution.add_project(TestProject::new(*name, format!("/work/demo/{}", name)));
    }
    Arc::new(solution)
}

pub fn view_model(
    host: Arc<FakeHost>,
    cleaner: Arc<FakeCleaner>,
    runners: Arc<RunnerMultiplexer>,
    store: Arc<dyn SettingsStore>,
) -> Arc<SettingsViewModel> {
    SettingsViewModel::new(host, cleaner, runners, store, ViewModelOptions::default())
}

pub fn memory_store() -> Arc<dyn SettingsStore> {
    Arc::new(MemorySettingsStore::new())
}
