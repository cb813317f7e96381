//! CLI binary tests using assert_cmd.
//!
//! Each test points the binary at temporary source, output and config
//! locations so the user's own configuration is never read.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

mod generators;

use generators::{sample_transcript, write_transcript};

fn ccv(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ccv"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("CCV_CONFIG")
        .env_remove("CCV_SOURCE")
        .env_remove("CCV_OUTPUT");
    cmd
}

fn setup() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    write_transcript(
        &home.path().join("projects"),
        "session-1",
        &sample_transcript(),
        std::time::SystemTime::now(),
    );
    home
}

#[test]
fn test_run_reports_summary() {
    let home = setup();
    let out = home.path().join("out");

    ccv(home.path())
        .arg("run")
        .arg("--source")
        .arg(home.path().join("projects"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new, 0 updated, 0 unchanged"))
        .stdout(predicate::str::contains("Dashboard lists 1 chats"));

    assert!(out.join("CCV-Dashboard.html").exists());
    assert!(out.join("Chats").join("Active").is_dir());
}

#[test]
fn test_bare_invocation_runs_and_json_summary() {
    let home = setup();
    let out = home.path().join("out");

    ccv(home.path())
        .args(["-s", &home.path().join("projects").to_string_lossy()])
        .args(["-o", &out.to_string_lossy()])
        .assert()
        .success();

    ccv(home.path())
        .args(["run", "--json"])
        .args(["-s", &home.path().join("projects").to_string_lossy()])
        .args(["-o", &out.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unchanged\": 1"))
        .stdout(predicate::str::contains("\"new\": 0"));
}

#[test]
fn test_quiet_suppresses_report() {
    let home = setup();
    ccv(home.path())
        .args(["run", "--quiet"])
        .arg("--source")
        .arg(home.path().join("projects"))
        .arg("--output")
        .arg(home.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_source_exits_with_code() {
    let home = tempfile::tempdir().unwrap();
    ccv(home.path())
        .arg("run")
        .arg("--source")
        .arg(home.path().join("nope"))
        .arg("--output")
        .arg(home.path().join("out"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Source directory not found"));
    assert!(!home.path().join("out").exists());
}

#[test]
fn test_invalid_config_exits_with_code() {
    let home = setup();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "[archive]\nfolder = \"Active\"\n").unwrap();

    ccv(home.path())
        .arg("--config")
        .arg(&config)
        .arg("--source")
        .arg(home.path().join("projects"))
        .arg("--output")
        .arg(home.path().join("out"))
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_config_init_and_show() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("ccv.toml");

    ccv(home.path())
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(config.exists());

    ccv(home.path())
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("inactive_days = 5"))
        .stdout(predicate::str::contains("index_filename = \"CCV-Dashboard.html\""));

    ccv(home.path())
        .args(["config", "path", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("ccv.toml"));
}

#[test]
fn test_help_lists_commands() {
    ccv(Path::new("/nonexistent"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}
