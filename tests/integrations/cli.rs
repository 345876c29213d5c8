//! Tests for the `notifyhub` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const SLACK_REQUEST: &str = r#"{
    "notification": {
        "title": "Queue backlog",
        "message": "orders queue above 10k",
        "severity": "warning",
        "metadata": {"type": "incident", "service": "orders"}
    },
    "target": {"channel": "slack"}
}"#;

/// Runs the binary from an empty directory with no provider environment.
fn notifyhub(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("notifyhub").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("NOTIFYHUB_DRY_RUN");
    cmd
}

#[test]
fn test_dry_run_request_from_stdin() {
    let workdir = TempDir::new().unwrap();
    notifyhub(&workdir)
        .arg("--dry-run")
        .write_stdin(SLACK_REQUEST)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"delivered\": true"))
        .stdout(predicate::str::contains("Dry-run: slack call skipped"));
}

#[test]
fn test_dry_run_request_array_from_file() {
    let workdir = TempDir::new().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{}, {{"notification": {{"title": "t", "message": "m"}},
              "target": {{"channel": "sms", "phone_number": "+15550100"}}}}]"#,
        SLACK_REQUEST
    )
    .unwrap();

    let output = notifyhub(&workdir)
        .arg("--dry-run")
        .arg("--request")
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let responses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let responses = responses.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["detail"], "Dry-run: slack call skipped");
    assert_eq!(responses[1]["detail"], "Dry-run: sms call skipped");
}

#[test]
fn test_undelivered_request_exits_with_two() {
    let workdir = TempDir::new().unwrap();
    let request = r#"{
        "notification": {"title": "t", "message": "m"},
        "target": {"channel": "telegram"}
    }"#;

    notifyhub(&workdir)
        .arg("--dry-run")
        .write_stdin(request)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Request validation failed"));
}

#[test]
fn test_malformed_input_exits_with_one() {
    let workdir = TempDir::new().unwrap();
    notifyhub(&workdir)
        .write_stdin("this is not json")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse request JSON"));
}

#[test]
fn test_invalid_config_file_exits_with_one() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(workdir.path().join("notifyhub.toml"), "request_timeout_seconds = \"soon\"")
        .unwrap();

    notifyhub(&workdir)
        .write_stdin(SLACK_REQUEST)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_malformed_request_reports_the_offending_field() {
    let workdir = TempDir::new().unwrap();
    notifyhub(&workdir)
        .write_stdin(r#"{"notification": {"title": "t", "message": "m"}}"#)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing field `target`"));
}
