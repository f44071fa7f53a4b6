// crates/bench-history-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite History Store
// Description: Durable HistoryStore backed by an append-only SQLite run log.
// Purpose: Persist benchmark runs with integrity checks and serialized writers.
// Dependencies: bench-history-core, parking_lot, rusqlite, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Each ingested run becomes one row of `suite_runs`, keyed by
//! `(repo_url, suite_name, commit_id)` and ordered by a per-suite sequence
//! number. Rows are never updated or deleted. Loads assemble the history
//! document from the rows inside a single read transaction and verify every
//! stored hash, failing closed on mismatch.
//!
//! Writers are serialized twice: in-process through a fair mutex acquired with a
//! bounded wait, and across processes through `BEGIN IMMEDIATE` governed by
//! the `SQLite` busy timeout. Either wait expiring surfaces as a retryable
//! contention error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use bench_history_core::HistoryDocument;
use bench_history_core::HistoryError;
use bench_history_core::HistoryStore;
use bench_history_core::IngestReceipt;
use bench_history_core::IngestStatus;
use bench_history_core::RepoUrl;
use bench_history_core::Run;
use bench_history_core::StorageError;
use bench_history_core::Suite;
use bench_history_core::SuiteName;
use bench_history_core::ValidationError;
use bench_history_core::hashing::DEFAULT_HASH_ALGORITHM;
use bench_history_core::hashing::HashAlgorithm;
use bench_history_core::hashing::HashError;
use bench_history_core::hashing::canonical_json_bytes_with_limit;
use bench_history_core::hashing::hash_bytes;
use bench_history_core::validation::MAX_RUN_BYTES;
use bench_history_core::validation::validate_ingest;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use parking_lot::MutexGuard;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum accepted busy timeout (ms).
pub const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Maximum read connection pool size.
pub const MAX_READ_POOL_SIZE: usize = 64;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Retry hint attached to contention errors.
const CONTENTION_RETRY_AFTER_MS: u64 = 250;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended; readers never block writers).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` history store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is in `1..=MAX_BUSY_TIMEOUT_MS` and bounds every lock wait.
/// - `read_pool_size` is in `1..=MAX_READ_POOL_SIZE`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of connections used for the read path.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default pragmas and limits.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default read connection pool size.
const fn default_read_pool_size() -> usize {
    4
}

/// Validates runtime limits in the store configuration.
fn validate_runtime_limits(config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    if config.busy_timeout_ms == 0 || config.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(SqliteStoreError::Invalid(format!(
            "busy_timeout_ms out of range: {} (1..={MAX_BUSY_TIMEOUT_MS})",
            config.busy_timeout_ms
        )));
    }
    if config.read_pool_size == 0 || config.read_pool_size > MAX_READ_POOL_SIZE {
        return Err(SqliteStoreError::Invalid(format!(
            "read_pool_size out of range: {} (1..={MAX_READ_POOL_SIZE})",
            config.read_pool_size
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw run payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or request data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Database lock was not acquired within the busy timeout.
    #[error("sqlite store busy: {0}")]
    Busy(String),
}

impl From<SqliteStoreError> for HistoryError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Storage(StorageError::Io(message)),
            SqliteStoreError::Db(message) | SqliteStoreError::Invalid(message) => {
                Self::Storage(StorageError::Backend(message))
            }
            SqliteStoreError::Corrupt(message) => Self::Storage(StorageError::Corrupt(message)),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Storage(StorageError::VersionMismatch(message))
            }
            SqliteStoreError::Busy(message) => Self::Contention {
                message,
                retry_after_ms: Some(CONTENTION_RETRY_AFTER_MS),
            },
        }
    }
}

/// Maps a `rusqlite` error, classifying lock contention as [`SqliteStoreError::Busy`].
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            SqliteStoreError::Busy(err.to_string())
        }
        _ => SqliteStoreError::Db(err.to_string()),
    }
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

/// Summary metadata for a stored repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// Repository identifier.
    pub repo_url: RepoUrl,
    /// Number of suites holding at least one run.
    pub suite_count: u64,
    /// Total runs across all suites.
    pub run_count: u64,
    /// Maximum run date (the document's `lastUpdate`).
    pub last_update: i64,
}

/// Summary metadata for a stored suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// Suite name.
    pub suite: SuiteName,
    /// Number of runs in the suite.
    pub run_count: u64,
    /// Maximum run date in the suite.
    pub latest_date: i64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed history store with WAL support.
///
/// # Invariants
/// - Stored rows are never updated or deleted.
/// - Loads verify stored hashes before deserialization.
/// - Writer connection access is serialized through a mutex handed to
///   waiters in arrival order.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared writer connection; released with a fair unlock.
    write_connection: Arc<parking_lot::Mutex<Connection>>,
    /// Connection pool used for the read path.
    read_connections: Arc<Vec<Mutex<Connection>>>,
    /// Round-robin cursor for read connection selection.
    read_cursor: Arc<AtomicUsize>,
}

/// Canonical run payload ready to insert.
#[derive(Debug)]
struct PreparedRun {
    /// Canonical JSON bytes for the run.
    run_json: Vec<u8>,
    /// Hash of `run_json`.
    run_hash: String,
    /// Algorithm used for `run_hash`.
    hash_algorithm: HashAlgorithm,
}

/// Raw row read back from `suite_runs`.
#[derive(Debug)]
struct StoredRunRow {
    /// Suite name column.
    suite_name: String,
    /// Commit id column.
    commit_id: String,
    /// Stored canonical JSON.
    run_json: Vec<u8>,
    /// Stored hash value.
    run_hash: String,
    /// Stored hash algorithm label.
    hash_algorithm: String,
}

impl SqliteHistoryStore {
    /// Opens an `SQLite`-backed history store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the configuration is invalid or the
    /// database cannot be opened or initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        validate_runtime_limits(&config)?;
        ensure_parent_dir(&config.path)?;
        let mut write_connection = open_connection(&config)?;
        initialize_schema(&mut write_connection)?;
        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0 .. config.read_pool_size {
            read_connections.push(Mutex::new(open_connection(&config)?));
        }
        Ok(Self {
            config,
            write_connection: Arc::new(parking_lot::Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Lists stored repositories ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_repositories(&self) -> Result<Vec<RepositorySummary>, SqliteStoreError> {
        let guard = self
            .read_connection()
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))?;
        let mut stmt = guard
            .prepare_cached(
                "SELECT repo_url, COUNT(DISTINCT suite_name), COUNT(1), MAX(run_date) FROM \
                 suite_runs GROUP BY repo_url ORDER BY repo_url",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| {
                let repo_url: String = row.get(0)?;
                let suite_count: i64 = row.get(1)?;
                let run_count: i64 = row.get(2)?;
                let last_update: i64 = row.get(3)?;
                Ok((repo_url, suite_count, run_count, last_update))
            })
            .map_err(db_error)?;
        let mut results = Vec::new();
        for row in rows {
            let (repo_url, suite_count, run_count, last_update) = row.map_err(db_error)?;
            results.push(RepositorySummary {
                repo_url: RepoUrl::new(repo_url),
                suite_count: count_to_u64(suite_count)?,
                run_count: count_to_u64(run_count)?,
                last_update,
            });
        }
        drop(stmt);
        drop(guard);
        Ok(results)
    }

    /// Lists the suites of one repository ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_suites(&self, repo_url: &RepoUrl) -> Result<Vec<SuiteSummary>, SqliteStoreError> {
        let guard = self
            .read_connection()
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))?;
        let mut stmt = guard
            .prepare_cached(
                "SELECT suite_name, COUNT(1), MAX(run_date) FROM suite_runs WHERE repo_url = ?1 \
                 GROUP BY suite_name ORDER BY suite_name",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![repo_url.as_str()], |row| {
                let suite: String = row.get(0)?;
                let run_count: i64 = row.get(1)?;
                let latest_date: i64 = row.get(2)?;
                Ok((suite, run_count, latest_date))
            })
            .map_err(db_error)?;
        let mut results = Vec::new();
        for row in rows {
            let (suite, run_count, latest_date) = row.map_err(db_error)?;
            results.push(SuiteSummary {
                suite: SuiteName::new(suite),
                run_count: count_to_u64(run_count)?,
                latest_date,
            });
        }
        drop(stmt);
        drop(guard);
        Ok(results)
    }

    /// Returns the next read connection using round-robin selection.
    fn read_connection(&self) -> &Mutex<Connection> {
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        &self.read_connections[index]
    }

    /// Acquires the writer connection, waiting at most the busy timeout.
    ///
    /// Waiters park in a queue; release through [`MutexGuard::unlock_fair`]
    /// hands the connection to the longest waiter.
    fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        let timeout = Duration::from_millis(self.config.busy_timeout_ms);
        self.write_connection.try_lock_for(timeout).ok_or_else(|| {
            SqliteStoreError::Busy(format!(
                "writer connection not acquired within {} ms",
                self.config.busy_timeout_ms
            ))
        })
    }

    /// Appends a prepared run inside one immediate transaction.
    fn append_run(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        run: &Run,
        prepared: &PreparedRun,
    ) -> Result<IngestReceipt, SqliteStoreError> {
        let mut guard = self.lock_writer()?;
        let tx =
            guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
        let exists: Option<i64> = {
            let mut stmt = tx
                .prepare_cached(
                    "SELECT seq FROM suite_runs WHERE repo_url = ?1 AND suite_name = ?2 AND \
                     commit_id = ?3",
                )
                .map_err(db_error)?;
            stmt.query_row(
                params![repo_url.as_str(), suite.as_str(), run.commit.id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?
        };
        let status = if exists.is_some() {
            IngestStatus::Duplicate
        } else {
            let next_seq: i64 = {
                let mut stmt = tx
                    .prepare_cached(
                        "SELECT COALESCE(MAX(seq), 0) + 1 FROM suite_runs WHERE repo_url = ?1 \
                         AND suite_name = ?2",
                    )
                    .map_err(db_error)?;
                stmt.query_row(params![repo_url.as_str(), suite.as_str()], |row| row.get(0))
                    .map_err(db_error)?
            };
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO suite_runs (repo_url, suite_name, seq, commit_id, run_date, \
                     run_json, run_hash, hash_algorithm, ingested_at) VALUES (?1, ?2, ?3, ?4, \
                     ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(db_error)?;
            stmt.execute(params![
                repo_url.as_str(),
                suite.as_str(),
                next_seq,
                run.commit.id.as_str(),
                run.date,
                prepared.run_json.as_slice(),
                prepared.run_hash.as_str(),
                prepared.hash_algorithm.label(),
                unix_millis()
            ])
            .map_err(db_error)?;
            IngestStatus::Appended
        };
        let document = read_document(&tx, repo_url)?;
        tx.commit().map_err(db_error)?;
        MutexGuard::unlock_fair(guard);
        Ok(IngestReceipt {
            document,
            status,
        })
    }

    /// Loads a document from a pooled read connection.
    fn load_document(&self, repo_url: &RepoUrl) -> Result<HistoryDocument, SqliteStoreError> {
        let mut guard = self
            .read_connection()
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Deferred).map_err(db_error)?;
        let document = read_document(&tx, repo_url)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(document)
    }

    /// Verifies the read and write paths can execute a simple statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        {
            let guard = self
                .read_connection()
                .lock()
                .map_err(|_| SqliteStoreError::Io("sqlite read mutex poisoned".to_string()))?;
            guard.execute_batch("SELECT 1").map_err(db_error)?;
        }
        let guard = self.lock_writer()?;
        guard.execute_batch("SELECT 1").map_err(db_error)?;
        MutexGuard::unlock_fair(guard);
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn ingest_with_status(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        mut run: Run,
    ) -> Result<IngestReceipt, HistoryError> {
        validate_ingest(repo_url, suite, &run)?;
        run.normalize_signed_zero();
        let prepared = prepare_run(&run)?;
        let receipt = self.append_run(repo_url, suite, &run, &prepared).map_err(|err| {
            if matches!(err, SqliteStoreError::Busy(_)) {
                warn!(
                    repo_url = %repo_url,
                    suite = %suite,
                    commit_id = %run.commit.id,
                    error = %err,
                    "sqlite history store contention"
                );
            }
            HistoryError::from(err)
        })?;
        match receipt.status {
            IngestStatus::Appended => info!(
                repo_url = %repo_url,
                suite = %suite,
                commit_id = %run.commit.id,
                last_update = receipt.document.last_update,
                "benchmark run appended"
            ),
            IngestStatus::Duplicate => debug!(
                repo_url = %repo_url,
                suite = %suite,
                commit_id = %run.commit.id,
                "benchmark run already recorded"
            ),
        }
        Ok(receipt)
    }

    fn load(&self, repo_url: &RepoUrl) -> Result<HistoryDocument, HistoryError> {
        Ok(self.load_document(repo_url)?)
    }

    fn readiness(&self) -> Result<(), HistoryError> {
        Ok(self.check_connection()?)
    }
}

// ============================================================================
// SECTION: Run Payloads
// ============================================================================

/// Canonicalizes and hashes a validated run.
fn prepare_run(run: &Run) -> Result<PreparedRun, HistoryError> {
    let run_json = canonical_json_bytes_with_limit(run, MAX_RUN_BYTES).map_err(|err| match err {
        HashError::SizeLimitExceeded {
            limit,
            actual,
        } => HistoryError::Validation(ValidationError::TooLarge {
            max_bytes: limit,
            actual_bytes: actual,
        }),
        HashError::Canonicalization(message) => SqliteStoreError::Invalid(message).into(),
    })?;
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &run_json);
    Ok(PreparedRun {
        run_json,
        run_hash: digest.value,
        hash_algorithm: digest.algorithm,
    })
}

/// Assembles a repository document from its stored rows.
fn read_document(
    connection: &Connection,
    repo_url: &RepoUrl,
) -> Result<HistoryDocument, SqliteStoreError> {
    let rows = {
        let mut stmt = connection
            .prepare_cached(
                "SELECT suite_name, commit_id, run_json, run_hash, hash_algorithm FROM \
                 suite_runs WHERE repo_url = ?1 ORDER BY suite_name, seq",
            )
            .map_err(db_error)?;
        let mapped = stmt
            .query_map(params![repo_url.as_str()], |row| {
                Ok(StoredRunRow {
                    suite_name: row.get(0)?,
                    commit_id: row.get(1)?,
                    run_json: row.get(2)?,
                    run_hash: row.get(3)?,
                    hash_algorithm: row.get(4)?,
                })
            })
            .map_err(db_error)?;
        mapped.collect::<Result<Vec<_>, _>>().map_err(db_error)?
    };
    let mut entries: BTreeMap<SuiteName, Suite> = BTreeMap::new();
    for row in rows {
        let run = decode_row(&row)?;
        entries.entry(SuiteName::new(row.suite_name)).or_default().push(run);
    }
    Ok(HistoryDocument::from_suites(repo_url.clone(), entries))
}

/// Verifies a stored row's hash and decodes its run.
fn decode_row(row: &StoredRunRow) -> Result<Run, SqliteStoreError> {
    if row.run_json.len() > MAX_RUN_BYTES {
        return Err(SqliteStoreError::Corrupt(format!(
            "stored run for commit {} exceeds size limit",
            row.commit_id
        )));
    }
    let algorithm = HashAlgorithm::from_label(&row.hash_algorithm).ok_or_else(|| {
        SqliteStoreError::Corrupt(format!("unsupported hash algorithm: {}", row.hash_algorithm))
    })?;
    let expected = hash_bytes(algorithm, &row.run_json);
    if expected.value != row.run_hash {
        return Err(SqliteStoreError::Corrupt(format!(
            "hash mismatch for commit {} in suite {}",
            row.commit_id, row.suite_name
        )));
    }
    let run: Run = serde_json::from_slice(&row.run_json)
        .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    if run.commit.id.as_str() != row.commit_id {
        return Err(SqliteStoreError::Corrupt(
            "commit_id mismatch between key and payload".to_string(),
        ));
    }
    Ok(run)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and bounded waits.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS suite_runs (
                    repo_url TEXT NOT NULL,
                    suite_name TEXT NOT NULL,
                    seq INTEGER NOT NULL,
                    commit_id TEXT NOT NULL,
                    run_date INTEGER NOT NULL,
                    run_json BLOB NOT NULL,
                    run_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    ingested_at INTEGER NOT NULL,
                    PRIMARY KEY (repo_url, suite_name, commit_id),
                    UNIQUE (repo_url, suite_name, seq)
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Converts a `COUNT` column into an unsigned count.
fn count_to_u64(value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value).map_err(|_| SqliteStoreError::Corrupt(format!("negative count: {value}")))
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
