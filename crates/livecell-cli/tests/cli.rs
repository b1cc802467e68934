//! End-to-end tests for the `livecell` binary's command-line surface.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn watch_reports_missing_file() {
    let mut cmd = Command::cargo_bin("livecell").unwrap();
    cmd.args(["watch", "/no/such/file/here.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn serve_reports_missing_file() {
    let mut cmd = Command::cargo_bin("livecell").unwrap();
    cmd.args(["serve", "/no/such/file/here.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn help_lists_both_subcommands() {
    let mut cmd = Command::cargo_bin("livecell").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn serve_help_documents_the_port_flag() {
    let mut cmd = Command::cargo_bin("livecell").unwrap();
    cmd.args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"));
}
