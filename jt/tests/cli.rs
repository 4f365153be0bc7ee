//! CLI smoke tests for the jt binary

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn jt() -> Command {
    Command::cargo_bin("jt").expect("jt binary builds")
}

#[test]
#[serial]
fn create_inspect_destroy_lifecycle() {
    let table = format!("/jt-cli-{}", std::process::id());

    jt().args(["--table", &table, "create", "--ncpu", "2", "--tslice", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created table"));

    // the name is now taken
    jt().args(["--table", &table, "create"]).assert().failure();

    jt().args(["--table", &table, "jobs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No jobs submitted"));

    jt().args(["--table", &table, "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no jobs submitted"));

    jt().args(["--table", &table, "destroy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Destroyed table"));

    jt().args(["--table", &table, "jobs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
#[serial]
fn create_rejects_zero_parameters() {
    let table = format!("/jt-cli-bad-{}", std::process::id());

    jt().args(["--table", &table, "create", "--ncpu", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));
}
