// crates/bench-history-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the bench-history binary end to end.
// Purpose: Ensure CI workflows ingest, export, import, and compare correctly.
// Dependencies: bench-history-cli binary
// ============================================================================

//! ## Overview
//! Runs the `bench-history` binary against a temporary `SQLite` store and
//! checks stdout, stderr, and exit codes for each command.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const REPO: &str = "https://github.com/acme/widget";
const SUITE: &str = "Rust Benchmark";

fn bench_history_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bench-history"))
}

/// Temp workspace with a config pointing at a fresh `SQLite` database.
struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = dir.path().join("bench-history.toml");
        let db = dir.path().join("history.db");
        let content = format!(
            "[store]\ntype = \"sqlite\"\npath = '{}'\nbusy_timeout_ms = 500\n",
            db.display()
        );
        fs::write(&config, content).expect("write config");
        Self {
            dir,
            config,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(bench_history_bin())
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("run bench-history")
    }

    fn write_run(&self, commit: &str, date: i64, value: f64) -> PathBuf {
        let run = json!({
            "commit": {
                "author": {"name": "Ada", "username": "ada"},
                "committer": {"name": "Ada", "username": "ada"},
                "id": commit,
                "message": format!("commit {commit}"),
                "timestamp": "2024-03-01T12:00:00Z",
                "url": format!("{REPO}/commit/{commit}")
            },
            "date": date,
            "tool": "cargo",
            "benches": [
                {"name": "parse", "value": value, "unit": "ns/iter", "range": "± 3"}
            ]
        });
        let path = self.path(&format!("run-{commit}.json"));
        fs::write(&path, serde_json::to_vec(&run).expect("encode run")).expect("write run");
        path
    }

    fn ingest(&self, run: &Path) -> Output {
        let run = run.to_str().expect("utf-8");
        self.run(&["ingest", "--repo", REPO, "--suite", SUITE, "--run", run])
    }
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

fn stdout_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn ingest_reports_appended_then_duplicate() {
    let workspace = Workspace::new();
    let first = workspace.write_run("abc123", 1000, 120.0);

    let output = workspace.ingest(&first);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let status = stdout_json(&output);
    assert_eq!(status["status"], "appended");
    assert_eq!(status["commit"], "abc123");
    assert_eq!(status["runs"], 1);
    assert_eq!(status["lastUpdate"], 1000);

    let output = workspace.ingest(&first);
    assert!(output.status.success());
    let status = stdout_json(&output);
    assert_eq!(status["status"], "duplicate");
    assert_eq!(status["runs"], 1);
}

#[test]
fn load_prints_document_with_exact_keys() {
    let workspace = Workspace::new();
    assert!(workspace.ingest(&workspace.write_run("abc123", 1000, 120.0)).status.success());
    assert!(workspace.ingest(&workspace.write_run("def456", 2000, 118.0)).status.success());

    let output = workspace.run(&["load", "--repo", REPO]);
    assert!(output.status.success());
    let document = stdout_json(&output);
    assert_eq!(document["lastUpdate"], 2000);
    assert_eq!(document["repoUrl"], REPO);
    let runs = document["entries"][SUITE].as_array().expect("suite runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["commit"]["id"], "abc123");
    assert_eq!(runs[1]["benches"][0]["range"], "± 3");
}

#[test]
fn load_unknown_repo_prints_empty_document() {
    let workspace = Workspace::new();
    let output = workspace.run(&["load", "--repo", "https://example.com/none"]);
    assert!(output.status.success());
    let document = stdout_json(&output);
    assert_eq!(document["lastUpdate"], 0);
    assert_eq!(document["entries"], json!({}));
}

#[test]
fn series_prints_points_in_append_order() {
    let workspace = Workspace::new();
    assert!(workspace.ingest(&workspace.write_run("abc123", 2000, 120.0)).status.success());
    assert!(workspace.ingest(&workspace.write_run("def456", 1000, 118.0)).status.success());

    let output =
        workspace.run(&["series", "--repo", REPO, "--suite", SUITE, "--name", "parse"]);
    assert!(output.status.success());
    let points = stdout_lines(&output);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0], json!({"date": 2000, "value": 120.0, "range": "± 3"}));
    assert_eq!(points[1]["date"], 1000);
}

#[test]
fn exported_data_js_imports_into_another_repo() {
    let workspace = Workspace::new();
    assert!(workspace.ingest(&workspace.write_run("abc123", 1000, 120.0)).status.success());
    assert!(workspace.ingest(&workspace.write_run("def456", 2000, 118.0)).status.success());

    let artifact = workspace.path("data.js");
    let artifact_arg = artifact.to_str().expect("utf-8");
    let output =
        workspace.run(&["load", "--repo", REPO, "--format", "data-js", "--out", artifact_arg]);
    assert!(output.status.success());
    let text = fs::read_to_string(&artifact).expect("read artifact");
    assert!(text.starts_with("window.BENCHMARK_DATA = "));

    let mirror = "https://github.com/acme/widget-mirror";
    let output = workspace.run(&["import", "--data-js", artifact_arg, "--repo", mirror]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!({"suites": 1, "appended": 2, "duplicates": 0}));

    let output = workspace.run(&["import", "--data-js", artifact_arg, "--repo", mirror]);
    assert_eq!(stdout_json(&output), json!({"suites": 1, "appended": 0, "duplicates": 2}));

    let original = stdout_json(&workspace.run(&["load", "--repo", REPO]));
    let copy = stdout_json(&workspace.run(&["load", "--repo", mirror]));
    assert_eq!(original["entries"], copy["entries"]);
    assert_eq!(copy["repoUrl"], mirror);
}

#[test]
fn compare_exits_non_zero_on_regression() {
    let workspace = Workspace::new();
    assert!(workspace.ingest(&workspace.write_run("abc123", 1000, 100.0)).status.success());
    assert!(workspace.ingest(&workspace.write_run("def456", 2000, 150.0)).status.success());

    let output = workspace.run(&["compare", "--repo", REPO, "--suite", SUITE]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    assert!(workspace.ingest(&workspace.write_run("0a1b2c", 3000, 450.0)).status.success());
    let output = workspace.run(&["compare", "--repo", REPO, "--suite", SUITE]);
    assert!(!output.status.success());
    let alerts = stdout_lines(&output);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["name"], "parse");
    assert_eq!(alerts[0]["ratio"], 3.0);
}

#[test]
fn invalid_run_fails_without_writing() {
    let workspace = Workspace::new();
    let run = workspace.write_run("", 1000, 120.0);
    let output = workspace.ingest(&run);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation failed"), "unexpected stderr: {stderr}");

    let document = stdout_json(&workspace.run(&["load", "--repo", REPO]));
    assert_eq!(document["entries"], json!({}));
}

#[test]
fn config_validate_accepts_valid_config() {
    let workspace = Workspace::new();
    let output = workspace.run(&["config", "validate"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config valid (store: sqlite)"), "unexpected stdout: {stdout}");
}

#[test]
fn config_validate_rejects_memory_with_path() {
    let workspace = Workspace::new();
    fs::write(&workspace.config, "[store]\ntype = \"memory\"\npath = \"history.db\"\n")
        .expect("write config");
    let output = workspace.run(&["config", "validate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("memory store must not set path"), "unexpected stderr: {stderr}");
}
