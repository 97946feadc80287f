//! Integration tests for the `qpw` CLI binary.
//!
//! These tests validate argument parsing, help output, offline criteria
//! commands, and configuration errors without touching a live platform
//! or the system keyring.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `qpw` binary with env isolation.
///
/// Clears all `QPW_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn qpw_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("qpw");
    cmd.env("HOME", "/tmp/qpw-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/qpw-cli-test-nonexistent")
        .env_remove("QPW_PROFILE")
        .env_remove("QPW_REGION")
        .env_remove("QPW_CLIENT_ID")
        .env_remove("QPW_OUTPUT")
        .env_remove("QPW_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

#[cfg(target_os = "linux")]
/// A [`qpw_cmd`] whose config directory is `home`, holding `config.toml`
/// with `contents`. Returns the config file path.
fn qpw_cmd_with_config(
    home: &std::path::Path,
    contents: &str,
) -> (assert_cmd::Command, std::path::PathBuf) {
    let dir = home.join("qpw");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();

    let mut cmd = qpw_cmd();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home);
    (cmd, path)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = qpw_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    qpw_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("login")
            .and(predicate::str::contains("lookups"))
            .and(predicate::str::contains("criteria"))
            .and(predicate::str::contains("--profile")),
    );
}

#[test]
fn test_version_flag() {
    qpw_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qpw"));
}

#[test]
fn test_invalid_output_format_is_usage_error() {
    qpw_cmd()
        .args(["-o", "xml", "status"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_lookup_kind_rejected() {
    let output = qpw_cmd().args(["lookups", "agents"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown lookup kind 'agents'"));
}

// ── Completions ─────────────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    qpw_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qpw"));
}

// ── Criteria (offline) ──────────────────────────────────────────────

#[test]
fn test_criteria_new_json() {
    qpw_cmd()
        .args(["criteria", "new", "--today", "2024-03-10", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"start\": \"2024-03-03\"")
                .and(predicate::str::contains("\"end\": \"2024-03-10\""))
                .and(predicate::str::contains("\"mediaType\": \"voice\""))
                .and(predicate::str::contains("\"direction\": \"both\"")),
        );
}

#[test]
fn test_criteria_new_plain_prints_range() {
    qpw_cmd()
        .args(["criteria", "new", "--today", "2024-03-10", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-03..2024-03-10"));
}

#[test]
fn test_criteria_new_rejects_bad_date() {
    qpw_cmd()
        .args(["criteria", "new", "--today", "10/03/2024"])
        .assert()
        .code(2);
}

#[test]
fn test_criteria_effective_clears_disabled_groups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("criteria.json");
    std::fs::write(
        &path,
        r#"{
            "dateRange": { "start": "2024-03-03", "end": "2024-03-10" },
            "mediaType": "chat",
            "direction": "inbound",
            "queues": ["q1"],
            "advanced": {
                "topicsEnabled": false,
                "topicsInclude": ["stale-topic"],
                "categoriesEnabled": true,
                "categoriesInclude": ["c1"]
            }
        }"#,
    )
    .unwrap();

    qpw_cmd()
        .args(["criteria", "effective", "-o", "json-compact"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"topicsInclude\":[]")
                .and(predicate::str::contains("\"categoriesInclude\":[\"c1\"]"))
                .and(predicate::str::contains("\"mediaType\":\"chat\"")),
        );
}

#[test]
fn test_criteria_effective_bad_json_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("criteria.json");
    std::fs::write(&path, "{ nope").unwrap();

    qpw_cmd()
        .args(["criteria", "effective"])
        .arg(&path)
        .assert()
        .code(2);
}

#[test]
fn test_criteria_effective_missing_file_fails() {
    qpw_cmd()
        .args(["criteria", "effective", "/tmp/qpw-cli-test-nonexistent/none.json"])
        .assert()
        .failure();
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_status_without_profile_explains_setup() {
    let output = qpw_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("No profile configured") && text.contains("qpw config init"),
        "Unexpected output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = qpw_cmd()
        .args(["--profile", "nope", "whoami"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("Profile 'nope' not found"));
}

#[test]
fn test_config_path_points_at_toml() {
    qpw_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_use_unknown_profile_fails() {
    qpw_cmd()
        .args(["config", "use", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'missing' not found"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_default_output_is_used() {
    let home = tempfile::tempdir().unwrap();
    let (mut cmd, _) = qpw_cmd_with_config(home.path(), "[defaults]\noutput = \"plain\"\n");

    cmd.args(["criteria", "new", "--today", "2024-03-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-03..2024-03-10"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_malformed_config_is_reported_not_defaulted() {
    let home = tempfile::tempdir().unwrap();
    let (mut cmd, _) = qpw_cmd_with_config(home.path(), "[profiles.eu\nclient_id = \"abc\"\n");

    let output = cmd.arg("status").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("config loading failed") && !text.contains("No profile configured"),
        "Unexpected output:\n{text}"
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_malformed_config_is_never_overwritten() {
    let home = tempfile::tempdir().unwrap();
    let contents = "[profiles.eu\nclient_id = \"abc\"\n";
    let (mut cmd, path) = qpw_cmd_with_config(home.path(), contents);

    cmd.args(["config", "set", "region", "mypurecloud.ie"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config loading failed"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
}
