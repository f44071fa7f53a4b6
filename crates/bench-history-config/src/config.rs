// crates/bench-history-config/src/config.rs
// ============================================================================
// Module: Bench History Configuration
// Description: Configuration loading and validation for the history store.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bench-history-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Loads `bench-history.toml`, applies defaults, and validates every field
//! before any store is opened. Resolution order is an explicit path, then the
//! `BENCH_HISTORY_CONFIG` environment variable, then `bench-history.toml` in
//! the working directory when present. With no file at all, the defaults
//! (a `SQLite` store at `bench-history.db`, `info` text logging) apply.
//!
//! Security posture: config files are untrusted input; sizes and path
//! lengths are bounded and unknown keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use bench_history_store_sqlite::SqliteStoreConfig;
use bench_history_store_sqlite::SqliteStoreMode;
use bench_history_store_sqlite::SqliteSyncMode;
use bench_history_store_sqlite::store::MAX_BUSY_TIMEOUT_MS;
use bench_history_store_sqlite::store::MAX_READ_POOL_SIZE;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name probed in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "bench-history.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "BENCH_HISTORY_CONFIG";
/// Maximum size of a config file in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default `SQLite` database path.
pub const DEFAULT_STORE_PATH: &str = "bench-history.db";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default read connection pool size.
const DEFAULT_READ_POOL_SIZE: usize = 4;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Top-level configuration for the bench history tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchHistoryConfig {
    /// History store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchHistoryConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// An explicit or environment-provided path must exist. The default
    /// file name is optional; when it is absent the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match resolve_path(path)? {
            ConfigSource::Explicit(path) => Self::load_file(&path),
            ConfigSource::Default(path) => {
                if path.is_file() {
                    Self::load_file(&path)
                } else {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Loads and validates one config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, too large, not
    /// UTF-8, malformed, or invalid.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = read_config_bytes(path)?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Store Config
// ============================================================================

/// History store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local in-memory store.
    Memory,
    /// Durable `SQLite`-backed store.
    #[default]
    Sqlite,
}

/// History store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path; defaults to [`DEFAULT_STORE_PATH`].
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds; bounds every lock wait.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode; sqlite only, defaults to WAL.
    #[serde(default)]
    pub journal_mode: Option<SqliteStoreMode>,
    /// `SQLite` synchronous mode; sqlite only, defaults to full.
    #[serde(default)]
    pub sync_mode: Option<SqliteSyncMode>,
    /// Number of pooled read connections; sqlite only.
    #[serde(default)]
    pub read_pool_size: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: None,
            sync_mode: None,
            read_pool_size: None,
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be between 1 and {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        match self.store_type {
            StoreType::Memory => {
                let sqlite_only = [
                    ("path", self.path.is_some()),
                    ("journal_mode", self.journal_mode.is_some()),
                    ("sync_mode", self.sync_mode.is_some()),
                    ("read_pool_size", self.read_pool_size.is_some()),
                ];
                if let Some((field, _)) = sqlite_only.iter().find(|(_, set)| *set) {
                    return Err(ConfigError::Invalid(format!("memory store must not set {field}")));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                if let Some(path) = &self.path {
                    validate_path_string("store.path", &path.to_string_lossy())?;
                }
                let read_pool_size = self.read_pool_size();
                if read_pool_size == 0 || read_pool_size > MAX_READ_POOL_SIZE {
                    return Err(ConfigError::Invalid(format!(
                        "store.read_pool_size must be between 1 and {MAX_READ_POOL_SIZE}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Returns the `SQLite` store config, or `None` for the memory backend.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => {
                let path =
                    self.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
                Some(SqliteStoreConfig {
                    path,
                    busy_timeout_ms: self.busy_timeout_ms,
                    journal_mode: self.journal_mode.unwrap_or_default(),
                    sync_mode: self.sync_mode.unwrap_or_default(),
                    read_pool_size: self.read_pool_size(),
                })
            }
        }
    }

    /// Returns the configured read pool size or the default.
    fn read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(DEFAULT_READ_POOL_SIZE)
    }
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Logging Config
// ============================================================================

/// Minimum log level emitted when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level.
    #[serde(default)]
    pub level: LogLevel,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Where the config path came from.
enum ConfigSource {
    /// Path given by the caller or the environment; must exist.
    Explicit(PathBuf),
    /// Default file name; optional.
    Default(PathBuf),
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource::Explicit(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource::Explicit(PathBuf::from(env_path)));
    }
    Ok(ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_NAME)))
}

/// Reads at most `MAX_CONFIG_FILE_SIZE + 1` bytes of the config file.
fn read_config_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let file = File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    let limit = u64::try_from(MAX_CONFIG_FILE_SIZE)
        .map_err(|_| ConfigError::Invalid("config size limit out of range".to_string()))?;
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    Ok(bytes)
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::path::Path;

    use super::ConfigError;
    use super::validate_path;
    use super::validate_path_string;

    #[test]
    fn overlong_component_is_rejected() {
        let long = "a".repeat(300);
        let err = validate_path(Path::new(&long)).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("config path component too long".to_string()));
    }

    #[test]
    fn blank_store_path_is_rejected() {
        let err = validate_path_string("store.path", "   ").unwrap_err();
        assert_eq!(err, ConfigError::Invalid("store.path must be non-empty".to_string()));
    }
}
