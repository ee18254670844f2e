//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "cardbox-cli", "--quiet", "--"])
        .args(args)
        .env("CARDBOX_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Extract the id from a "Something created: <id>" first line.
fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| line.rsplit(' ').next())
        .expect("expected a created-id line")
        .to_string()
}

#[test]
fn test_user_create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["user", "create", "alice"]);
    assert_eq!(code, 0, "user create failed: {stderr}");
    assert!(stdout.contains("User created:"));

    let (stdout, _, code) = run_cli(dir.path(), &["user", "list"]);
    assert_eq!(code, 0);
    let users: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["name"], "alice");
}

#[test]
fn test_review_flow() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["user", "create", "alice"]);

    let (stdout, stderr, code) = run_cli(dir.path(), &["deck", "create", "Rust"]);
    assert_eq!(code, 0, "deck create failed: {stderr}");
    let deck_id = created_id(&stdout);

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["card", "add", &deck_id, "What is ownership?", "Move semantics"],
    );
    assert_eq!(code, 0, "card add failed: {stderr}");
    let card_id = created_id(&stdout);

    // Fresh card is due immediately.
    let (stdout, _, code) = run_cli(dir.path(), &["due"]);
    assert_eq!(code, 0);
    let due: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(due.as_array().unwrap().len(), 1);

    let (stdout, stderr, code) = run_cli(dir.path(), &["review", &card_id, "good"]);
    assert_eq!(code, 0, "review failed: {stderr}");
    assert!(stdout.contains("Card reviewed (good): box 2"));

    // Rescheduled into the future: nothing due anymore.
    let (stdout, _, code) = run_cli(dir.path(), &["due"]);
    assert_eq!(code, 0);
    let due: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(due.as_array().unwrap().is_empty());

    let (stdout, _, code) = run_cli(dir.path(), &["card", "history", &card_id]);
    assert_eq!(code, 0);
    let logs: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["grade"], "good");
}

#[test]
fn test_invalid_grade_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["user", "create", "alice"]);
    let (stdout, _, _) = run_cli(dir.path(), &["deck", "create", "Rust"]);
    let deck_id = created_id(&stdout);
    let (stdout, _, _) = run_cli(dir.path(), &["card", "add", &deck_id, "q", "a"]);
    let card_id = created_id(&stdout);

    let (_, stderr, code) = run_cli(dir.path(), &["review", &card_id, "fine"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid grade"));
}

#[test]
fn test_missing_user_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["due"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unauthorized"));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["config", "get", "scheduler.initial_interval_days"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1.0");

    let (_, _, code) = run_cli(
        dir.path(),
        &["config", "set", "scheduler.initial_interval_days", "2"],
    );
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["config", "get", "scheduler.initial_interval_days"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2.0");
}

#[test]
fn test_stats_empty() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["user", "create", "alice"]);
    let (stdout, _, code) = run_cli(dir.path(), &["stats"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_reviews"], 0);
    assert_eq!(stats["due_now"], 0);
}
