//! End-to-end tests for the `veryscan` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn veryscan(db: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("veryscan").unwrap();
    cmd.arg("--db")
        .arg(db)
        .env_remove("VERYSCAN_STRATEGY")
        .env_remove("VERYSCAN_LOG_LEVEL")
        .env_remove("VERYSCAN_LOG_DIR");
    cmd
}

/// Creates a migrated database with the given items already catalogued.
fn seeded_db(ids: &[&str]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("items.db");
    let conn = veryscan_core::db::open_db(&path).unwrap();
    for id in ids {
        conn.execute("INSERT INTO items (id) VALUES (?1);", [*id])
            .unwrap();
    }
    (tmp, path)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_lists_lending_commands() {
    Command::cargo_bin("veryscan")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("checkout"))
        .stdout(predicate::str::contains("flag"));
}

#[test]
fn checkout_prints_ack_and_show_reflects_it() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["checkout", "arduino-1", "Kshitij"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked out arduino-1!"));

    let output = veryscan(&db).args(["show", "arduino-1"]).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["item"]["status"], "Checked Out");
    assert_eq!(json["item"]["lastCheckedOutBy"], "Kshitij");
    assert_eq!(json["item"]["isFlagged"], false);
}

#[test]
fn flag_then_return_keeps_flag_set() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db).args(["flag", "arduino-1"]).assert().success();
    veryscan(&db)
        .args(["--strategy", "compare-and-swap", "return", "arduino-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Returned arduino-1!"));

    let output = veryscan(&db).args(["show", "arduino-1"]).output().unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["item"]["status"], "Available");
    assert_eq!(json["item"]["isFlagged"], true);
}

#[test]
fn blank_actor_exits_with_invalid_request() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["checkout", "arduino-1", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid_request"));
}

#[test]
fn unknown_item_exits_with_not_found() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["return", "ghost"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not_found"));
}

#[test]
fn missing_database_exits_with_store_unavailable() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("absent.db");

    veryscan(&db)
        .args(["flag", "arduino-1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("store_unavailable"));
    assert!(!db.exists());
}

#[test]
fn unknown_strategy_is_rejected_by_argument_parsing() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["--strategy", "yolo", "flag", "arduino-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn per_item_queue_is_rejected_for_single_shot_invocations() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["--strategy", "per-item-queue", "flag", "arduino-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("compare-and-swap"));

    let output = veryscan(&db).args(["show", "arduino-1"]).output().unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["item"]["status"], "Available");
    assert_eq!(json["item"]["version"], 0);
}

#[test]
fn log_level_and_dir_start_file_logging() {
    let (tmp, db) = seeded_db(&["arduino-1"]);
    let log_dir = tmp.path().join("logs");

    veryscan(&db)
        .arg("--log-level")
        .arg("debug")
        .arg("--log-dir")
        .arg(&log_dir)
        .args(["checkout", "arduino-1", "Kshitij"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked out arduino-1!"));

    assert!(log_dir.is_dir());
}

#[test]
fn log_level_without_log_dir_is_rejected() {
    let (_tmp, db) = seeded_db(&["arduino-1"]);

    veryscan(&db)
        .args(["--log-level", "debug", "flag", "arduino-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--log-dir"));
}
