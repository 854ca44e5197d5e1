use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

#[test]
fn help_lists_both_subcommands() {
    let mut cmd = Command::cargo_bin("vault-mirror").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn sync_requires_a_config_argument() {
    let mut cmd = Command::cargo_bin("vault-mirror").expect("Binary exists");
    cmd.arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn sync_with_missing_config_file_fails_with_diagnostics() {
    let mut cmd = Command::cargo_bin("vault-mirror").expect("Binary exists");
    cmd.args(["sync", "--config", "/definitely/not/a/real/config.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn sync_with_malformed_config_fails_with_diagnostics() {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(config.path(), b"remote: [broken\n").expect("Writing temp config failed");

    let mut cmd = Command::cargo_bin("vault-mirror").expect("Binary exists");
    cmd.args(["sync", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config YAML"));
}
