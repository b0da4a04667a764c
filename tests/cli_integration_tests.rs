//! CLI Integration Tests
//!
//! Runs the startup-analytics binary against .xlsx fixtures using assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    source: PathBuf,
    cache: PathBuf,
}

impl Workspace {
    fn new(write: fn(&Path)) -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("startups.xlsx");
        let cache = dir.path().join("startups.parquet");
        write(&source);
        Self {
            _dir: dir,
            source,
            cache,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--source")
            .arg(&self.source)
            .arg("--cache")
            .arg(&self.cache);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).arg("--json").output().unwrap();
        assert!(output.status.success(), "{:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("startup-analytics"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("startup-analytics"));
}

#[test]
fn test_list_help() {
    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--exclude-unfunded"));
}

// ═══════════════════════════════════════════════════════════════════════════
// LIST
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_list_shows_rows_and_missing_columns() {
    let ws = Workspace::new(common::write_startups);
    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("$ 2.00M"))
        .stdout(predicate::str::contains("Not disclosed"))
        .stderr(predicate::str::contains("Tier column not found"));
    assert!(ws.cache.exists());
}

#[test]
fn test_list_json_with_sector_filter() {
    let ws = Workspace::new(common::write_startups);
    let rows = ws.json(&["list", "--sector", "Fintech"]);

    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["company"], "Acme");
    assert_eq!(rows[0]["funding_numeric"], 2_000_000.0);
}

#[test]
fn test_list_exclude_unfunded() {
    let ws = Workspace::new(common::write_startups);
    let rows = ws.json(&["list", "--exclude-unfunded"]);
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let rows = ws.json(&["list", "--unfunded-only"]);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["company"], "Beta");
    assert_eq!(rows[0]["funding_numeric"], Value::Null);
}

#[test]
fn test_list_keyword_and_range() {
    let ws = Workspace::new(common::write_directory);

    let rows = ws.json(&["list", "--keyword", "PAYMENTS"]);
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["company"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acme Pay", "Delta Health"]);

    let rows = ws.json(&["list", "--min-funding", "1000000", "--max-funding", "5000000"]);
    let rows = rows.as_array().unwrap();
    // Acme Pay ($2M) plus Gamma Farms, whose undisclosed funding passes by default
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_list_limit() {
    let ws = Workspace::new(common::write_directory);
    let rows = ws.json(&["list", "--limit", "2"]);
    assert_eq!(rows.as_array().unwrap().len(), 2);
}

#[test]
fn test_list_export() {
    let ws = Workspace::new(common::write_directory);
    let out = ws.source.with_file_name("tier1.xlsx");

    ws.cmd()
        .args(["list", "--tier", "Tier 1", "--export"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 rows"));

    let load = startup_analytics::excel::ExcelImporter::new(&out)
        .import()
        .unwrap();
    assert_eq!(load.header_row, 0);
    assert_eq!(load.table.row_count(), 3);
    assert!(load.table.column("hot_startup").is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE / INSIGHTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_profile_json() {
    let ws = Workspace::new(common::write_directory);
    let profile = ws.json(&["profile", "Beta Learn"]);

    assert_eq!(profile["company"], "Beta Learn");
    assert_eq!(profile["founders"], "B. Iyer");
    assert_eq!(profile["funding_display"], "$ 0.50M");
    assert_eq!(profile["email"], Value::Null);
}

#[test]
fn test_profile_unknown_company_falls_back() {
    let ws = Workspace::new(common::write_directory);
    ws.cmd()
        .args(["profile", "Nonexistent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Pay"))
        .stderr(predicate::str::contains("'Nonexistent' not found"));
}

#[test]
fn test_insights_json() {
    let ws = Workspace::new(common::write_directory);
    let insights = ws.json(&["insights"]);

    let years: Vec<i64> = insights["founding_years"]
        .as_array()
        .unwrap()
        .iter()
        .map(|y| y["year"].as_i64().unwrap())
        .collect();
    assert_eq!(years, vec![2016, 2019, 2021]);

    let stages = insights["stages"].as_array().unwrap();
    assert!(stages
        .iter()
        .any(|b| b["label"] == "Unfunded" && b["count"] == 1));
    assert!(stages.iter().any(|b| b["label"] == "Pre-Seed"));

    let cities = insights["cities"].as_array().unwrap();
    assert_eq!(cities.len(), 4);
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE SUBCOMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cache_lifecycle() {
    let ws = Workspace::new(common::write_startups);

    let status = ws.json(&["cache", "status"]);
    assert_eq!(status["state"], "absent");

    ws.cmd()
        .args(["cache", "rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Header row: 3"));

    let status = ws.json(&["cache", "status"]);
    assert_eq!(status["state"], "valid");
    assert_eq!(status["rows"], 2);

    ws.cmd()
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!ws.cache.exists());
}

fn write_two_sheets(path: &Path) {
    let first: &[&[&str]] = &[&["Company", "Sector"], &["Acme", "Fintech"]];
    let second: &[&[&str]] = &[&["Company", "Sector"], &["Zeta", "Agritech"]];
    common::write_named_sheets(path, &[("First", first), ("Second", second)]);
}

#[test]
fn test_sheet_switch_is_not_served_from_cache() {
    let ws = Workspace::new(write_two_sheets);

    let rows = ws.json(&["--sheet", "First", "list"]);
    assert_eq!(rows[0]["company"], "Acme");

    let status = ws.json(&["--sheet", "Second", "cache", "status"]);
    assert_eq!(status["state"]["stale"], "config_changed");

    let rows = ws.json(&["--sheet", "Second", "list"]);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["company"], "Zeta");
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS AND CONFIG
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.arg("--source")
        .arg(dir.path().join("missing.xlsx"))
        .arg("--cache")
        .arg(dir.path().join("missing.parquet"))
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Source file not found"));
}

#[test]
fn test_header_not_found_fails() {
    let ws = Workspace::new(|path| common::write_sheet(path, &[&["Name"], &["Acme"]]));
    ws.cmd()
        .arg("insights")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Header row not found"));
}

#[test]
fn test_source_from_env_and_config_file() {
    let ws = Workspace::new(common::write_startups);
    let config = ws.source.with_file_name("analytics.yaml");
    std::fs::write(
        &config,
        format!("cache: {}\nttl_secs: 0\n", ws.cache.display()),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.env("STARTUP_ANALYTICS_SOURCE", &ws.source)
        .env("STARTUP_ANALYTICS_CONFIG", &config)
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Acme\""));
    assert!(ws.cache.exists());
}

#[test]
fn test_bad_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("analytics.yaml");
    std::fs::write(&config, "unknown_key: 1\n").unwrap();

    let mut cmd = Command::cargo_bin("startup-analytics").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .args(["cache", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
