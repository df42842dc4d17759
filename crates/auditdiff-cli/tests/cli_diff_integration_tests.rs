//! CLI diff integration tests
//!
//! These tests run the `auditdiff` binary against snapshot files on disk
//! and inspect its stdout and exit status.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_auditdiff"))
        .current_dir(dir.path())
        .env_remove("AUDITDIFF_MAX_ELEMENTS")
        .env_remove("AUDITDIFF_IGNORE_COLLECTION_ORDER")
        .env_remove("AUDITDIFF_ID_FIELDS")
        .env_remove("AUDITDIFF_ROOT_TYPE_NAME")
        .env_remove("AUDITDIFF_WORKERS")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_diff_reports_field_update() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "before.json", r#"{"name": "Alice", "age": 30}"#);
    write(temp_dir.path(), "after.json", r#"{"name": "Alice", "age": 31}"#);

    let output = run(
        &temp_dir,
        &["diff", "--before", "before.json", "--after", "after.json"],
    );
    let json = stdout_json(&output);

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["metadata"]["fqdn"], "age");
    assert_eq!(records[0]["previous_value"], 30);
    assert_eq!(records[0]["updated_value"], 31);
    assert_eq!(json["stats"]["updated"], 1);
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn test_cli_diff_ignore_order_with_id_field() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "before.json",
        r#"{"items": [{"id": 1, "v": "a"}, {"id": 2, "v": "b"}]}"#,
    );
    write(
        temp_dir.path(),
        "after.json",
        r#"{"items": [{"id": 2, "v": "b"}, {"id": 1, "v": "c"}]}"#,
    );

    let output = run(
        &temp_dir,
        &[
            "diff",
            "--before",
            "before.json",
            "--after",
            "after.json",
            "--ignore-order",
            "--id-field",
            "id",
        ],
    );
    let json = stdout_json(&output);

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["metadata"]["fqdn"], "items[id=1].v");
}

#[test]
fn test_cli_diff_without_before_creates_everything() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "after.json", r#"{"a": 1, "b": {"c": true}}"#);

    let output = run(&temp_dir, &["diff", "--after", "after.json"]);
    let json = stdout_json(&output);

    assert_eq!(json["stats"]["created"], 2);
    assert_eq!(json["stats"]["deleted"], 0);
}

#[test]
fn test_cli_diff_text_format() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "before.json", r#"{"age": 30}"#);
    write(temp_dir.path(), "after.json", r#"{"age": 31}"#);

    let output = run(
        &temp_dir,
        &[
            "diff",
            "--before",
            "before.json",
            "--after",
            "after.json",
            "--format",
            "text",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("## Change Summary"));
    assert!(stdout.contains("- `age`: `30` → `31`"));
}

#[test]
fn test_cli_diff_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "auditdiff.toml",
        "root_type_name = \"Customer\"\n",
    );
    write(temp_dir.path(), "before.json", r#"{"age": 30}"#);
    write(temp_dir.path(), "after.json", r#"{"age": 31}"#);

    let output = run(
        &temp_dir,
        &[
            "diff",
            "--config",
            "auditdiff.toml",
            "--before",
            "before.json",
            "--after",
            "after.json",
        ],
    );
    let json = stdout_json(&output);

    assert_eq!(json["records"][0]["metadata"]["fqdn"], "Customer.age");
}

#[test]
fn test_cli_diff_capacity_overflow_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "auditdiff.json",
        r#"{"max_elements": 1, "ignore_collection_order": {"enabled": true}}"#,
    );
    write(temp_dir.path(), "before.json", r#"{"tags": ["a", "b"]}"#);
    write(temp_dir.path(), "after.json", r#"{"tags": ["c"]}"#);

    let output = run(
        &temp_dir,
        &[
            "diff",
            "--config",
            "auditdiff.json",
            "--before",
            "before.json",
            "--after",
            "after.json",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
}

#[test]
fn test_cli_diff_invalid_json_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "before.json", "{not json");

    let output = run(&temp_dir, &["diff", "--before", "before.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid JSON"), "stderr: {}", stderr);
}
