//! CLI end-to-end tests
//!
//! Tests for the ladderforge command-line interface. None of them need the
//! external tools installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the ladderforge binary
#[allow(deprecated)]
fn ladderforge_cmd() -> Command {
    Command::cargo_bin("ladderforge").unwrap()
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("config.json");
    fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_cli_no_args_shows_help() {
    ladderforge_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    ladderforge_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ladderforge"));
}

#[test]
fn test_cli_run_help() {
    ladderforge_cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("full pipeline"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_cli_validate_defaults() {
    ladderforge_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Minimum artifacts: 5"));
}

#[test]
fn test_cli_validate_reports_warnings() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), r#"{"pipeline": {"min_artifacts": 0}}"#);
    ladderforge_cmd()
        .args(["validate", config.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("warning: pipeline.min_artifacts"));
}

#[test]
fn test_cli_validate_rejects_malformed_json() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), "{ not json");
    ladderforge_cmd()
        .args(["validate", config.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

#[test]
fn test_cli_plan_with_duration() {
    let temp = tempdir().unwrap();
    let config = write_config(
        temp.path(),
        &format!(r#"{{"storage": {{"bucket_mount": "{}"}}}}"#, temp.path().display()),
    );
    ladderforge_cmd()
        .args([
            "--config", config.as_str(), "plan", "clip.mp4", "--id", "r1", "--tracker", "t",
            "--directory", "uploads", "--duration", "47.9",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("r1 (local): 10 stages"))
        .stdout(predicate::str::contains("generatePoster@00:00:05"))
        .stdout(predicate::str::contains("generateThumbnailSprite(columns=4)"))
        .stdout(predicate::str::contains("r1_ipfs/r1_v7.mp4"));
}

#[test]
fn test_cli_plan_remote_requires_orchestrator() {
    ladderforge_cmd()
        .args(["plan", "clip.mp4", "--kind", "remote", "--duration", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("orchestrator_addr"));
}

#[test]
fn test_cli_plan_rejects_bad_duration() {
    ladderforge_cmd()
        .args(["plan", "clip.mp4", "--duration", "N/A"])
        .assert()
        .failure();
}

#[test]
fn test_cli_probe_nonexistent_file() {
    ladderforge_cmd()
        .args(["probe", "/nonexistent/path/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_id_needs_single_file() {
    ladderforge_cmd()
        .args(["plan", "a.mp4", "b.mp4", "--id", "x", "--duration", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single source file"));
}

#[test]
fn test_cli_assemble_directory() {
    let out = tempdir().unwrap();
    let store = tempdir().unwrap();
    for i in 3..=7 {
        fs::write(out.path().join(format!("r1_v{i}.mp4")), format!("v{i}")).unwrap();
    }
    ladderforge_cmd()
        .args([
            "assemble",
            out.path().to_str().unwrap(),
            "--id",
            "r1",
            "--store",
            store.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"content_id\""))
        .stdout(predicate::str::contains("r1_v6.mp4"));
    assert!(store.path().join("directory_r1.json").exists());
    assert!(!out.path().join("r1_v7.mp4").exists());
}

#[test]
fn test_cli_assemble_incomplete_fails() {
    let out = tempdir().unwrap();
    fs::write(out.path().join("r1_v3.mp4"), "v3").unwrap();
    ladderforge_cmd()
        .args(["assemble", out.path().to_str().unwrap(), "--id", "r1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("found 1"));
}

#[test]
fn test_cli_check_tools_command() {
    ladderforge_cmd().arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg").and(predicate::str::contains("thumbsgenerator")),
    );
}
