//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a vdt command
pub fn vdt() -> Command {
    Command::new(cargo::cargo_bin!("vdt"))
}

/// Write a batch input file with one VDS number per line
pub fn write_batch_file(tmp: &TempDir, codes: &[&str]) -> PathBuf {
    let path = tmp.path().join("codes.txt");
    std::fs::write(&path, codes.join("\n")).unwrap();
    path
}
