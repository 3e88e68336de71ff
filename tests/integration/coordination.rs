use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use testdeck::error::ApiError;
use testdeck::workspace::{HostEvent, SolutionInfo};

use crate::support::{memory_store, runners, solution, view_model, FakeCleaner, FakeHost};

#[tokio::test]
async fn refresh_isolates_project_failures() {
    let host = FakeHost::with_solution(&[]);
    let cleaner = FakeCleaner::new();
    cleaner.set_size("alpha", 10);
    cleaner.set_size("gamma", 30);
    cleaner.fail("beta");
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, cleaner, runners, memory_store());
    let tree = solution(&["alpha", "beta", "gamma"]);
    vm.set_test_solution(Some(Arc::clone(&tree)));

    let summary = vm.refresh().wait().await.unwrap();

    assert_eq!(summary.projects.updated.len(), 2);
    assert_eq!(summary.projects.failures.len(), 1);
    assert_eq!(summary.projects.failures[0].project, "beta");
    assert!(matches!(
        summary.projects.failures[0].error,
        ApiError::ProjectQueryFailed { .. }
    ));
    let sizes: Vec<Option<u64>> = tree
        .projects()
        .iter()
        .map(|node| node.output().map(|o| o.total_size()))
        .collect();
    assert_eq!(sizes, vec![Some(10), None, Some(30)]);
}

#[tokio::test]
async fn clean_is_observed_by_the_following_refresh() {
    let host = FakeHost::with_solution(&[]);
    let cleaner = FakeCleaner::new();
    cleaner.set_size("alpha", 4096);
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, Arc::clone(&cleaner), runners, memory_store());
    let tree = solution(&["alpha"]);
    vm.set_test_solution(Some(Arc::clone(&tree)));

    vm.refresh_project_sizes().await;
    let node = tree.find_project("alpha").unwrap();
    let target = node.output().unwrap();
    assert_eq!(target.total_size(), 4096);

    vm.commands().clean_test_output.execute(target).await.unwrap();

    assert_eq!(node.output().unwrap().total_size(), 0);
    let calls = cleaner.calls();
    let clean_at = calls.iter().position(|c| c == "clean:alpha").unwrap();
    assert_eq!(calls[clean_at + 1], "query:alpha");
}

#[tokio::test]
async fn clear_command_tracks_selection() {
    let host = FakeHost::with_solution(&["/work/demo/Local.testsettings"]);
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, FakeCleaner::new(), runners, memory_store());
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    let clear = &vm.commands().clear_test_settings;
    clear.subscribe_can_execute_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!clear.can_execute(&()));
    assert!(matches!(
        clear.execute(()).await,
        Err(ApiError::CommandDisabled(_))
    ));

    vm.selected_test_settings()
        .set(Some("/work/demo/Local.testsettings".to_string()))
        .await
        .unwrap();
    assert!(clear.can_execute(&()));
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    clear.execute(()).await.unwrap();
    assert_eq!(vm.selected_test_settings().get(), None);
    assert!(!clear.can_execute(&()));
    assert_eq!(changes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn host_events_trigger_refresh() {
    let host = FakeHost::new();
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(Arc::clone(&host), FakeCleaner::new(), runners, memory_store());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    vm.test_settings_files().subscribe(move |items| {
        let _ = tx.send(items.as_ref().clone());
    });
    let _listener = vm.attach();

    host.load(SolutionInfo {
        name: "demo".to_string(),
        root: PathBuf::from("/work/demo"),
    });
    host.set_files(&[
        "/work/demo/b.testsettings",
        "/work/demo/A.TestSettings",
        "/work/demo/readme.md",
        "/work/demo/b.testsettings",
    ]);
    host.emit(HostEvent::BuildFinished);

    let items = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        items,
        vec![
            "/work/demo/A.TestSettings".to_string(),
            "/work/demo/b.testsettings".to_string(),
        ]
    );
    assert!(vm
        .test_settings_files()
        .contains(&"/work/demo/b.testsettings".to_string()));
}

#[tokio::test]
async fn solution_opened_triggers_refresh() {
    let host = FakeHost::new();
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(Arc::clone(&host), FakeCleaner::new(), runners, memory_store());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    vm.test_settings_files().subscribe(move |items| {
        let _ = tx.send(items.as_ref().clone());
    });
    let _listener = vm.attach();

    let info = SolutionInfo {
        name: "demo".to_string(),
        root: PathBuf::from("/work/demo"),
    };
    host.load(info.clone());
    host.set_files(&["/work/demo/Local.testsettings"]);
    host.emit(HostEvent::SolutionOpened(info));

    let items = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(items, vec!["/work/demo/Local.testsettings".to_string()]);
}

#[tokio::test]
async fn refresh_returns_before_slow_queries_complete() {
    let host = FakeHost::with_solution(&["/work/demo/Local.testsettings"]);
    let cleaner = FakeCleaner::new();
    cleaner.set_size("alpha", 512);
    cleaner.close_gate();
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, Arc::clone(&cleaner), runners, memory_store());
    let tree = solution(&["alpha"]);
    vm.set_test_solution(Some(Arc::clone(&tree)));
    let node = tree.find_project("alpha").unwrap();

    let handles = vm.refresh();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(cleaner.calls(), vec!["query:alpha".to_string()]);
    assert!(!handles.project_sizes.is_finished());
    assert!(node.output().is_none());

    cleaner.open_gate();
    let summary = handles.wait().await.unwrap();

    assert_eq!(summary.projects.updated.len(), 1);
    assert_eq!(node.output().unwrap().total_size(), 512);
    assert_eq!(*summary.settings_files, vec!["/work/demo/Local.testsettings".to_string()]);
}

#[tokio::test]
async fn navigate_command_opens_file_in_host() {
    let host = FakeHost::with_solution(&[]);
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(Arc::clone(&host), FakeCleaner::new(), runners, memory_store());

    vm.commands()
        .navigate_to_file
        .execute(PathBuf::from("/work/demo/Local.testsettings"))
        .await
        .unwrap();

    assert_eq!(
        *host.actions.lock(),
        vec!["navigate:/work/demo/Local.testsettings".to_string()]
    );
}

#[tokio::test]
async fn refresh_without_solution_is_a_quiet_no_op() {
    let host = FakeHost::new();
    let cleaner = FakeCleaner::new();
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, Arc::clone(&cleaner), runners, memory_store());
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    vm.test_settings_files().subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let summary = vm.refresh().wait().await.unwrap();

    assert!(summary.settings_files.is_empty());
    assert!(summary.projects.updated.is_empty());
    assert!(summary.projects.is_complete());
    assert!(cleaner.calls().is_empty());
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_runner_keeps_current_selection() {
    let host = FakeHost::with_solution(&[]);
    let (runners, _) = runners(&["libtest", "nextest"]);
    let vm = view_model(host, FakeCleaner::new(), runners, memory_store());

    assert_eq!(vm.test_runners(), vec!["libtest", "nextest"]);
    assert_eq!(vm.selected_test_runner().as_deref(), Some("libtest"));

    let err = vm.set_selected_test_runner("xunit").await.unwrap_err();

    assert!(matches!(err, ApiError::UnknownImplementation(name) if name == "xunit"));
    assert_eq!(vm.selected_test_runner().as_deref(), Some("libtest"));
}

#[tokio::test]
async fn runs_go_to_the_selected_runner_with_current_settings() {
    let host = FakeHost::with_solution(&[]);
    let (runners, recorders) = runners(&["libtest", "nextest"]);
    let vm = view_model(host, FakeCleaner::new(), runners, memory_store());
    vm.set_test_solution(Some(solution(&["alpha"])));

    vm.set_selected_test_runner("nextest").await.unwrap();
    vm.filters().set("Category=Fast".to_string()).await.unwrap();
    vm.selected_test_settings()
        .set(Some("/work/demo/Local.testsettings".to_string()))
        .await
        .unwrap();
    let report = vm.run_tests("alpha").await.unwrap();

    assert_eq!(report.runner, "nextest");
    assert!(recorders[0].requests.lock().is_empty());
    let requests = recorders[1].requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].project_root, PathBuf::from("/work/demo/alpha"));
    assert_eq!(requests[0].filters, "Category=Fast");
    assert_eq!(
        requests[0].settings_file,
        Some(PathBuf::from("/work/demo/Local.testsettings"))
    );
}

#[tokio::test]
async fn run_for_unknown_project_is_unavailable() {
    let host = FakeHost::with_solution(&[]);
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(host, FakeCleaner::new(), runners, memory_store());

    assert!(matches!(
        vm.run_tests("alpha").await,
        Err(ApiError::CollaboratorUnavailable(_))
    ));
    vm.set_test_solution(Some(solution(&["beta"])));
    assert!(matches!(
        vm.run_tests("alpha").await,
        Err(ApiError::CollaboratorUnavailable(_))
    ));
}

#[tokio::test]
async fn manifest_commands_reach_the_host() {
    let host = FakeHost::with_solution(&[]);
    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(Arc::clone(&host), FakeCleaner::new(), runners, memory_store());
    let commands = vm.commands();

    commands.open_license.execute(()).await.unwrap();
    commands.open_release_notes.execute(()).await.unwrap();
    commands.open_web_site.execute(()).await.unwrap();
    commands
        .open_path
        .execute(PathBuf::from("/work/demo/alpha/TestResults"))
        .await
        .unwrap();

    let shown = host.shown.lock();
    assert_eq!(shown[0].0, "testdeck License");
    assert_eq!(shown[1].0, "testdeck Release Notes");
    let actions = host.actions.lock();
    assert_eq!(actions[0], format!("url:{}", vm.manifest().website));
    assert_eq!(actions[1], "explore:/work/demo/alpha/TestResults");
}
