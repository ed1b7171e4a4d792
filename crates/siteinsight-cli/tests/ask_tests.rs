//! Integration tests for the ask and config commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn siteinsight_cmd(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("siteinsight").unwrap();
    cmd.env("SITEINSIGHT_CONFIG", config.to_str().unwrap())
        .env_remove("SITEINSIGHT_DEMO_MODE")
        .env_remove("RUST_LOG");
    cmd
}

/// Demo data with an LLM endpoint nothing listens on
fn write_offline_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yml");
    fs::write(
        &path,
        "llm_service:\n  url: http://127.0.0.1:9\n  model: test-model\n  api_key: sk-secret\n  timeout_secs: 2\nretry:\n  max_attempts: 1\n  min_wait_ms: 0\n  max_wait_ms: 0\ndemo_mode: true\n",
    )
    .unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    siteinsight_cmd(&dir.path().join("missing.yml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("mcp"));
}

#[test]
fn test_ask_requires_a_query() {
    let dir = TempDir::new().unwrap();
    siteinsight_cmd(&dir.path().join("missing.yml"))
        .arg("ask")
        .assert()
        .failure();
}

#[test]
fn test_short_query_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    siteinsight_cmd(&dir.path().join("missing.yml"))
        .args(["--format", "json", "ask", "hi"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"invalid_input\""))
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn test_bad_property_id_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    siteinsight_cmd(&dir.path().join("missing.yml"))
        .args(["ask", "how many users", "--property-id", "GA-12"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Error (invalid_input)"));
}

#[test]
fn test_unreachable_model_reports_extraction_failure() {
    let dir = TempDir::new().unwrap();
    let config = write_offline_config(&dir);

    siteinsight_cmd(&config)
        .args([
            "--format",
            "json",
            "ask",
            "How many users visited last week?",
            "--property-id",
            "123456789",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("parameter_extraction_error"))
        .stdout(predicate::str::contains("request_id"));
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.yml");
    siteinsight_cmd(&config)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.yml"));
}

#[test]
fn test_config_redacts_secrets() {
    let dir = TempDir::new().unwrap();
    let config = write_offline_config(&dir);

    siteinsight_cmd(&config)
        .args(["--format", "json", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:9"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("sk-secret").not());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.yml");
    fs::write(&config, "retry:\n  min_wait_ms: 5000\n  max_wait_ms: 10\n").unwrap();

    siteinsight_cmd(&config)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("retry.min_wait_ms"));
}
