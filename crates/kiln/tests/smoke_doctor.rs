//! Smoke tests for the doctor command
//!
//! Doctor is tolerant by design: it reports an unreachable daemon instead
//! of failing, so these tests pass with or without Docker present.

use assert_cmd::Command;
use predicates::str as pred_str;
use serde_json::Value;

fn kiln() -> Command {
    Command::cargo_bin("kiln").unwrap()
}

#[test]
fn doctor_text_reports_socket_and_daemon() {
    kiln()
        .arg("doctor")
        .assert()
        .success()
        .stdout(pred_str::contains("Daemon socket:"))
        .stdout(pred_str::contains("Docker daemon:"));
}

#[test]
fn doctor_json_is_structured() {
    let assert = kiln().arg("doctor").arg("--json").assert().success();
    let output = assert.get_output();
    let json: Value = serde_json::from_slice(&output.stdout).expect("doctor --json output parses");

    assert!(json.get("cli_version").and_then(Value::as_str).is_some());
    assert!(json.get("socket_path").and_then(Value::as_str).is_some());
    assert!(json.get("daemon_reachable").and_then(Value::as_bool).is_some());
}

#[test]
fn doctor_reports_configured_socket_override() {
    kiln()
        .arg("doctor")
        .arg("--docker-host")
        .arg("/tmp/custom.sock")
        .assert()
        .success()
        .stdout(pred_str::contains("/tmp/custom.sock"));
}

#[test]
fn doctor_with_unreachable_socket_still_succeeds() {
    kiln()
        .arg("doctor")
        .arg("--docker-host")
        .arg("/definitely/missing.sock")
        .assert()
        .success()
        .stdout(pred_str::contains("not reachable"));
}
