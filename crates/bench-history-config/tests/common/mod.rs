// crates/bench-history-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Build configs from inline TOML and temporary files.
// ============================================================================

//! Shared helpers for config integration tests.

#![allow(dead_code, reason = "Helpers are shared across test binaries.")]

use std::fs;
use std::path::PathBuf;

use bench_history_config::BenchHistoryConfig;
use bench_history_config::ConfigError;
use tempfile::TempDir;

/// Parses and validates inline TOML.
pub fn config_from_toml(content: &str) -> Result<BenchHistoryConfig, ConfigError> {
    BenchHistoryConfig::parse(content)
}

/// Returns the config produced by an empty file.
pub fn minimal_config() -> Result<BenchHistoryConfig, ConfigError> {
    config_from_toml("")
}

/// Writes `content` to a config file inside a fresh temp dir.
pub fn write_config(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench-history.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}
