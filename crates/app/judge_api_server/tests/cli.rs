use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_store_and_database_options() {
    Command::cargo_bin("judge_api_server")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--memory-store"))
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn rejects_non_numeric_port() {
    Command::cargo_bin("judge_api_server")
        .unwrap()
        .args(["--port", "http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}
