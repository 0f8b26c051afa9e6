//! Smoke tests -- verify the binary runs and the subcommands are wired.

use assert_cmd::Command;
use predicates::prelude::*;

fn rollcall(config_dir: &std::path::Path) -> Command {
    let config = config_dir.join("rollcall.toml");
    let db = config_dir.join("rollcall.db");
    std::fs::write(
        &config,
        format!("[storage]\ndb_path = {:?}\n", db.to_string_lossy()),
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("rollcall").unwrap();
    cmd.env("ROLLCALL_CONFIG", &config).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Face-verified attendance"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rollcall"));
}

#[test]
fn test_serve_subcommand_exists() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success();
}

#[test]
fn test_new_meeting_id() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .arg("new-meeting-id")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9A-Z]{6}\n$").unwrap());
}

#[test]
fn test_records_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    rollcall(dir.path())
        .arg("records")
        .assert()
        .success()
        .stdout(predicate::str::contains("No meetings found."));
}

#[test]
fn test_simulate_then_export() {
    let dir = tempfile::tempdir().unwrap();
    rollcall(dir.path())
        .args(["simulate", "--seconds", "1", "--meeting", "SMOKE1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"meeting_id\": \"SMOKE1\""));

    rollcall(dir.path())
        .args(["export", "--meeting", "SMOKE1", "--output"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 0 rows"));

    let exported: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("attendance_SMOKE1_"))
        .collect();
    assert_eq!(exported.len(), 1);
    let csv = std::fs::read_to_string(exported[0].path()).unwrap();
    assert_eq!(csv, "Meeting ID,Name,Roll Number,Join Time,Status,Verification\n");
}
