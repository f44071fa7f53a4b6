// crates/bench-history-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Store, logging, and file-level config validation.
// Purpose: Ensure invalid configs fail closed before any store opens.
// ============================================================================

//! Config validation tests for bench-history.toml.

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::path::PathBuf;

use bench_history_config::BenchHistoryConfig;
use bench_history_config::ConfigError;
use bench_history_config::DEFAULT_STORE_PATH;
use bench_history_config::LogFormat;
use bench_history_config::LogLevel;
use bench_history_config::MAX_CONFIG_FILE_SIZE;
use bench_history_config::StoreType;
use bench_history_store_sqlite::SqliteStoreMode;
use bench_history_store_sqlite::SqliteSyncMode;
use common::config_from_toml;
use common::minimal_config;
use common::write_config;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<BenchHistoryConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_config_uses_sqlite_defaults() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    assert_eq!(config.store.store_type, StoreType::Sqlite);
    assert_eq!(config.store.busy_timeout_ms, 5_000);
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.logging.format, LogFormat::Text);
    let sqlite = config.store.sqlite_config().ok_or("expected sqlite config")?;
    assert_eq!(sqlite.path, PathBuf::from(DEFAULT_STORE_PATH));
    assert_eq!(sqlite.journal_mode, SqliteStoreMode::Wal);
    assert_eq!(sqlite.sync_mode, SqliteSyncMode::Full);
    assert_eq!(sqlite.read_pool_size, 4);
    Ok(())
}

#[test]
fn full_config_round_trips_into_store_config() -> TestResult {
    let config = config_from_toml(
        r#"
[store]
type = "sqlite"
path = "data/history.db"
busy_timeout_ms = 250
journal_mode = "delete"
sync_mode = "normal"
read_pool_size = 2

[logging]
level = "debug"
format = "json"
"#,
    )
    .map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite_config().ok_or("expected sqlite config")?;
    assert_eq!(sqlite.path, PathBuf::from("data/history.db"));
    assert_eq!(sqlite.busy_timeout_ms, 250);
    assert_eq!(sqlite.journal_mode, SqliteStoreMode::Delete);
    assert_eq!(sqlite.sync_mode, SqliteSyncMode::Normal);
    assert_eq!(sqlite.read_pool_size, 2);
    assert_eq!(config.logging.level.as_str(), "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    Ok(())
}

#[test]
fn memory_store_has_no_sqlite_config() -> TestResult {
    let config =
        config_from_toml("[store]\ntype = \"memory\"\n").map_err(|err| err.to_string())?;
    assert!(config.store.sqlite_config().is_none());
    Ok(())
}

// ============================================================================
// SECTION: Store Validation
// ============================================================================

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_invalid(
        config_from_toml("[store]\ntype = \"memory\"\npath = \"history.db\"\n"),
        "memory store must not set path",
    )
}

#[test]
fn memory_store_rejects_sqlite_settings() -> TestResult {
    assert_invalid(
        config_from_toml("[store]\ntype = \"memory\"\njournal_mode = \"delete\"\n"),
        "memory store must not set journal_mode",
    )?;
    assert_invalid(
        config_from_toml("[store]\ntype = \"memory\"\nsync_mode = \"normal\"\n"),
        "memory store must not set sync_mode",
    )?;
    assert_invalid(
        config_from_toml("[store]\ntype = \"memory\"\nread_pool_size = 2\n"),
        "memory store must not set read_pool_size",
    )
}

#[test]
fn sqlite_store_rejects_blank_path() -> TestResult {
    assert_invalid(
        config_from_toml("[store]\ntype = \"sqlite\"\npath = \"  \"\n"),
        "store.path must be non-empty",
    )
}

#[test]
fn zero_busy_timeout_is_rejected() -> TestResult {
    assert_invalid(config_from_toml("[store]\nbusy_timeout_ms = 0\n"), "store.busy_timeout_ms")
}

#[test]
fn oversized_busy_timeout_is_rejected() -> TestResult {
    assert_invalid(
        config_from_toml("[store]\nbusy_timeout_ms = 600001\n"),
        "store.busy_timeout_ms",
    )
}

#[test]
fn read_pool_size_out_of_range_is_rejected() -> TestResult {
    assert_invalid(config_from_toml("[store]\nread_pool_size = 0\n"), "store.read_pool_size")?;
    assert_invalid(config_from_toml("[store]\nread_pool_size = 65\n"), "store.read_pool_size")
}

#[test]
fn unknown_store_type_is_rejected() -> TestResult {
    assert_invalid(config_from_toml("[store]\ntype = \"postgres\"\n"), "config parse error")
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    assert_invalid(config_from_toml("[store]\nmax_versions = 3\n"), "config parse error")?;
    assert_invalid(config_from_toml("[server]\nbind = \"x\"\n"), "config parse error")
}

#[test]
fn unknown_log_level_is_rejected() -> TestResult {
    assert_invalid(config_from_toml("[logging]\nlevel = \"loud\"\n"), "config parse error")
}

// ============================================================================
// SECTION: File Loading
// ============================================================================

#[test]
fn load_reads_explicit_file() -> TestResult {
    let (_dir, path) = write_config(b"[logging]\nlevel = \"warn\"\n");
    let config = BenchHistoryConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    assert_eq!(config.logging.level, LogLevel::Warn);
    Ok(())
}

#[test]
fn load_missing_explicit_file_fails() -> TestResult {
    let (dir, _path) = write_config(b"");
    let missing = dir.path().join("absent.toml");
    assert_invalid(BenchHistoryConfig::load(Some(&missing)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut content = b"# ".to_vec();
    content.resize(MAX_CONFIG_FILE_SIZE + 1, b'x');
    let (_dir, path) = write_config(&content);
    assert_invalid(BenchHistoryConfig::load(Some(&path)), "config file exceeds size limit")
}

#[test]
fn load_rejects_file_far_beyond_limit() -> TestResult {
    let content = vec![b'#'; MAX_CONFIG_FILE_SIZE * 4];
    let (_dir, path) = write_config(&content);
    assert_invalid(BenchHistoryConfig::load(Some(&path)), "config file exceeds size limit")
}

#[test]
fn load_accepts_file_at_limit() -> TestResult {
    let mut content = b"[logging]\nlevel = \"warn\"\n#".to_vec();
    content.resize(MAX_CONFIG_FILE_SIZE, b'x');
    let (_dir, path) = write_config(&content);
    let config = BenchHistoryConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    assert_eq!(config.logging.level, LogLevel::Warn);
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let (_dir, path) = write_config(&[0xff, 0xfe, 0x00]);
    assert_invalid(BenchHistoryConfig::load(Some(&path)), "config file must be utf-8")
}

#[test]
fn load_rejects_overlong_path_component() -> TestResult {
    let path = PathBuf::from("a".repeat(300));
    assert_invalid(BenchHistoryConfig::load(Some(&path)), "config path component too long")
}
