use std::fs;
use std::path::Path;

use tempfile::TempDir;
use testdeck::config::DeckConfig;
use testdeck::runner::RunnerConfig;
use testdeck::tooling::cli::{CliContext, Commands, RunnerCommands, SettingCommands};

fn workspace(temp_dir: &TempDir) -> std::path::PathBuf {
    let root = temp_dir.path().join("workspace");
    for (project, bytes) in [("core", 64usize), ("cli", 0)] {
        fs::create_dir_all(root.join(project)).unwrap();
        fs::write(root.join(project).join("Cargo.toml"), "[package]").unwrap();
        if bytes > 0 {
            fs::create_dir_all(root.join(project).join("coverage")).unwrap();
            fs::write(root.join(project).join("coverage/lcov.info"), vec![b'x'; bytes]).unwrap();
        }
    }
    root
}

fn config(store: &Path) -> DeckConfig {
    let mut config = DeckConfig::default();
    config.storage.store_path = store.to_path_buf();
    config
}

#[tokio::test]
async fn outputs_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let cli = CliContext::with_config(
        workspace(&temp_dir),
        config(&temp_dir.path().join("store")),
    )
    .unwrap();

    let output = cli
        .execute(&Commands::Outputs {
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let core = rows
        .iter()
        .find(|row| row.get("project").and_then(|v| v.as_str()) == Some("core"))
        .unwrap();
    let directories = core["output"]["directories"].as_array().unwrap();
    assert_eq!(directories.len(), 1);
    assert_eq!(directories[0]["size_bytes"].as_u64(), Some(64));
    assert!(core["error"].is_null());
}

#[tokio::test]
async fn settings_list_covers_every_key() {
    let temp_dir = TempDir::new().unwrap();
    let cli = CliContext::with_config(
        workspace(&temp_dir),
        config(&temp_dir.path().join("store")),
    )
    .unwrap();

    let output = cli
        .execute(&Commands::Settings {
            command: SettingCommands::List,
        })
        .await
        .unwrap();

    for key in testdeck::types::keys::TEXT_KEYS
        .iter()
        .chain(testdeck::types::keys::TOGGLE_KEYS.iter())
    {
        assert!(output.contains(key), "missing {} in\n{}", key, output);
    }
    assert!(output.contains("test_runner"));
}

#[cfg(unix)]
#[tokio::test]
async fn runners_run_uses_configured_process() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(&temp_dir.path().join("store"));
    config.runners.insert(
        "shell".to_string(),
        RunnerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string(), "testdeck".to_string()],
        },
    );
    let cli = CliContext::with_config(workspace(&temp_dir), config).unwrap();

    let listed = cli
        .execute(&Commands::Runners {
            command: RunnerCommands::List,
        })
        .await
        .unwrap();
    assert!(listed.contains("shell"));

    let output = cli
        .execute(&Commands::Runners {
            command: RunnerCommands::Run {
                project: "core".to_string(),
            },
        })
        .await
        .unwrap();
    assert!(output.starts_with("core"));
    assert!(output.contains("exit 0"));
}
