//! Binary-level tests for `vstage-reconcile`

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("vstage-reconcile").unwrap();
    cmd.env_remove("JSON_OUTPUT").env("LOG_LEVEL", "error");
    cmd
}

#[test]
fn test_help_lists_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--project-id"))
        .stdout(predicate::str::contains("--status"));
}

#[test]
fn test_non_numeric_batch_size_is_usage_error() {
    cmd().args(["--batch-size", "lots"]).assert().code(2);
}

#[test]
fn test_invalid_project_id_exits_non_zero() {
    cmd()
        .args(["--dry-run", "--project-id", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid project_id: invalid UUID length"));
}

#[test]
fn test_unreachable_database_exits_non_zero() {
    cmd()
        .env("DATABASE_URL", "postgresql://vstage@127.0.0.1:1/vstage")
        .env("DATABASE_CONNECT_TIMEOUT", "1")
        .env("DATABASE_MIN_CONNECTIONS", "0")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database error"));
}
