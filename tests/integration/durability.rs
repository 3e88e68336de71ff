use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use testdeck::error::ApiError;
use testdeck::store::{SettingsStore, SledSettingsStore};

use crate::support::{runners, view_model, FakeCleaner, FakeHost, RejectingStore};

fn sled_store(temp_dir: &TempDir) -> Arc<dyn SettingsStore> {
    Arc::new(SledSettingsStore::open(&temp_dir.path().join("settings")).unwrap())
}

#[tokio::test]
async fn settings_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let (runners, _) = runners(&["libtest"]);
        let vm = view_model(
            FakeHost::with_solution(&[]),
            FakeCleaner::new(),
            runners,
            sled_store(&temp_dir),
        );
        vm.exclude_files().set("*.Designer.cs".to_string()).await.unwrap();
        vm.show_branch_coverage().set(false).await.unwrap();
        vm.selected_test_settings()
            .set(Some("/work/demo/Local.testsettings".to_string()))
            .await
            .unwrap();
    }

    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(
        FakeHost::with_solution(&[]),
        FakeCleaner::new(),
        runners,
        sled_store(&temp_dir),
    );

    assert_eq!(vm.exclude_files().get(), "*.Designer.cs");
    assert!(!vm.show_branch_coverage().get());
    assert!(vm.show_line_coverage().get());
    assert_eq!(
        vm.exclude_attributes().get(),
        "*.ExcludeFromCodeCoverage*"
    );
    assert_eq!(
        vm.selected_test_settings().get().as_deref(),
        Some("/work/demo/Local.testsettings")
    );
    assert!(vm.commands().clear_test_settings.can_execute(&()));
}

#[tokio::test]
async fn runner_preference_is_restored_when_registered() {
    let temp_dir = TempDir::new().unwrap();
    {
        let (runners, _) = runners(&["libtest", "nextest"]);
        let vm = view_model(
            FakeHost::with_solution(&[]),
            FakeCleaner::new(),
            runners,
            sled_store(&temp_dir),
        );
        vm.set_selected_test_runner("nextest").await.unwrap();
    }

    {
        let (runners, _) = runners(&["libtest", "nextest"]);
        let vm = view_model(
            FakeHost::with_solution(&[]),
            FakeCleaner::new(),
            runners,
            sled_store(&temp_dir),
        );
        assert_eq!(vm.selected_test_runner().as_deref(), Some("nextest"));
    }

    let (runners, _) = runners(&["libtest"]);
    let vm = view_model(
        FakeHost::with_solution(&[]),
        FakeCleaner::new(),
        runners,
        sled_store(&temp_dir),
    );
    assert_eq!(vm.selected_test_runner().as_deref(), Some("libtest"));
}

#[tokio::test]
async fn rejected_write_changes_nothing() {
    let (runners, _) = runners(&["libtest", "nextest"]);
    let vm = view_model(
        FakeHost::with_solution(&[]),
        FakeCleaner::new(),
        runners,
        Arc::new(RejectingStore),
    );
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    vm.filters().subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = vm.filters().set("Category=Slow".to_string()).await.unwrap_err();
    assert!(matches!(err, ApiError::PersistenceError { ref key, .. } if key == "filters"));
    assert_eq!(vm.filters().get(), "");
    assert_eq!(notifications.load(Ordering::SeqCst), 0);

    assert!(vm.set_selected_test_runner("nextest").await.is_err());
    assert_eq!(vm.selected_test_runner().as_deref(), Some("libtest"));
}
