//! Command-line behaviour and exit-status contract

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;
use common::{create_test_log, log_line, MAX_TS};

/// Binary invocation isolated from the caller's environment and config files.
///
/// Runs inside `dir` with `HOME` and `XDG_CONFIG_HOME` pointing there, so
/// neither `./traffic-analyzer.toml` nor a per-user config is picked up.
fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("traffic-analyzer").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_OUTPUT")
        .env_remove("TRAFFIC_ANALYZER_TOP_IPS")
        .env_remove("TRAFFIC_ANALYZER_TOP_URLS")
        .env_remove("TRAFFIC_ANALYZER_FIELDS")
        .env_remove("TRAFFIC_ANALYZER_LOG_DIR");
    cmd
}

fn sample_log(dir: &TempDir) -> std::path::PathBuf {
    let lines = vec![
        log_line(MAX_TS, "10.0.0.1", "GET", "/index.html", 200, 2048),
        log_line(MAX_TS - 30, "10.0.0.1", "GET", "/index.html", 200, 2048),
        log_line(MAX_TS - 60, "10.0.0.2", "POST", "/login", 401, 64),
        "this line is broken".to_string(),
        log_line(MAX_TS - 90_000, "10.0.0.3", "GET", "/old", 500, 0),
    ];
    create_test_log(dir.path(), "access.log", &lines).unwrap()
}

#[test]
fn test_text_report() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);

    cmd(&dir)
        .arg(&log)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRAFFIC ANALYSIS REPORT"))
        .stdout(predicate::str::contains("Total requests: 4"))
        .stdout(predicate::str::contains("Unique IPs: 3"))
        .stdout(predicate::str::contains("Invalid lines skipped: 1"))
        .stdout(predicate::str::contains("1. 10.0.0.1: 2 requests"))
        .stdout(predicate::str::contains("- GET: 75.00%"))
        .stdout(predicate::str::contains("- Server errors (5xx): 1"))
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);

    let output = cmd(&dir)
        .arg(&log)
        .args(["--json", "--status", "200"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totalRequests"], 2);
    assert_eq!(json["status"]["average2xxBytes"], 2048.0);
    assert_eq!(json["filters"]["statusLow"], 200);
    assert_eq!(json["recent"]["hourly"].as_array().unwrap().len(), 24);
}

#[test]
fn test_no_matches_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);

    cmd(&dir)
        .arg(&log)
        .args(["--method", "delete", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total requests: 0"))
        .stdout(predicate::str::contains("(no data)"))
        .stderr(predicate::str::contains("No valid records matched the filters."));
}

#[test]
fn test_missing_file_exits_non_zero() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .arg(dir.path().join("missing.log"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot open log file"));
}

#[test]
fn test_invalid_filters_exit_with_config_error() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);

    for args in [
        vec!["--status", "499-400"],
        vec!["--status", "abc"],
        vec!["--start", "200", "--end", "100"],
        vec!["--top", "0"],
        vec!["--top", "-3"],
        vec!["--method", "BREW"],
    ] {
        cmd(&dir).arg(&log).args(&args).assert().code(2);
    }
}

#[test]
fn test_invalid_filter_reported_before_missing_file() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .arg(dir.path().join("missing.log"))
        .args(["--status", "600-500"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid --status range"));
}

#[test]
fn test_config_file_sets_top_limit() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);
    let config = dir.path().join("analyzer.toml");
    std::fs::write(&config, "[report]\ntop_ips = 1\n").unwrap();

    cmd(&dir)
        .arg(&log)
        .arg("--no-color")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 1 active IPs:"))
        .stdout(predicate::str::contains("2. 10.0.0.").not());
}

#[test]
fn test_bad_config_file_exits_with_config_error() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);
    let config = dir.path().join("analyzer.toml");
    std::fs::write(&config, "[report]\ntop_ips = 0\n").unwrap();

    cmd(&dir)
        .arg(&log)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2);
}

#[test]
fn test_config_discovered_in_working_directory() {
    let dir = TempDir::new().unwrap();
    let log = sample_log(&dir);
    std::fs::write(
        dir.path().join("traffic-analyzer.toml"),
        "[report]\ntop_ips = 1\ntop_urls = 1\n",
    )
    .unwrap();

    cmd(&dir)
        .arg(&log)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 1 active IPs:"))
        .stdout(predicate::str::contains("Top 1 requested URLs:"));
}
