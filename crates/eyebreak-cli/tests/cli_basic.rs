//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data directory
//! and verify outputs.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "eyebreak-cli", "--"])
        .args(args)
        .env("EYEBREAK_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_timer_status() {
    // Stop first so the replay of elapsed seconds has nothing to print and
    // stdout is a single JSON document.
    let (_, _, code) = run_cli(&["timer", "stop"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "Timer status failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("status is not JSON");
    assert_eq!(parsed["type"], "StateSnapshot");
}

#[test]
fn test_timer_start_then_stop() {
    let (_, _, code) = run_cli(&["timer", "start"]);
    assert_eq!(code, 0, "Timer start failed");

    let (stdout, _, code) = run_cli(&["timer", "stop"]);
    assert_eq!(code, 0, "Timer stop failed");
    assert!(stdout.contains("TimerStopped"));

    // Stopping again still succeeds.
    let (_, _, code) = run_cli(&["timer", "stop"]);
    assert_eq!(code, 0);
}

#[test]
fn test_timer_pause_without_countdown_prints_snapshot() {
    let (_, _, code) = run_cli(&["timer", "stop"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(&["timer", "pause"]);
    assert_eq!(code, 0, "Timer pause failed");
    assert!(stdout.contains("StateSnapshot"));
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "Config list failed");
    assert!(stdout.contains("[timer]"));
    assert!(stdout.contains("work_interval_secs"));
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "timer.break_secs"]);
    assert_eq!(code, 0, "Config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, _, code) = run_cli(&["config", "get", "timer.no_such_key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_roundtrip() {
    let (_, _, code) = run_cli(&["config", "set", "timer.warning_secs", "45"]);
    assert_eq!(code, 0, "Config set failed");
    let (stdout, _, code) = run_cli(&["config", "get", "timer.warning_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "45");
}

#[test]
fn test_config_set_rejects_overnight_work_hours() {
    let (_, _, code) = run_cli(&["config", "set", "work_hours.start_hour", "23.0"]);
    assert_ne!(code, 0, "overnight span should be rejected");
}

#[test]
fn test_stats_today() {
    let (stdout, _, code) = run_cli(&["stats", "today"]);
    assert_eq!(code, 0, "Stats today failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stats is not JSON");
    assert!(parsed["breaks_completed"].is_u64());
}

#[test]
fn test_stats_recent() {
    let (stdout, _, code) = run_cli(&["stats", "recent", "--days", "7"]);
    assert_eq!(code, 0, "Stats recent failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stats is not JSON");
    assert!(parsed.is_array());
}

#[test]
fn test_completions() {
    let (stdout, _, code) = run_cli(&["completions", "bash"]);
    assert_eq!(code, 0, "Completions failed");
    assert!(stdout.contains("eyebreak"));
}
