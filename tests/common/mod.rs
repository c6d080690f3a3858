#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Reference timestamp used across tests: 2024-01-15T12:00:00Z.
pub const MAX_TS: i64 = 1_705_320_000;

pub fn log_line(ts: i64, ip: &str, method: &str, path: &str, status: u16, bytes: u64) -> String {
    format!("{ts} {ip} {method} {path} {status} {bytes}")
}

pub fn create_test_log(dir: &Path, filename: &str, lines: &[String]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}
