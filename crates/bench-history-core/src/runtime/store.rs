// crates/bench-history-core/src/runtime/store.rs
// ============================================================================
// Module: Bench History In-Memory Store
// Description: Process-local history store with per-repository write leases.
// Purpose: Provide a deterministic store for tests, demos, and one-shot CLI runs.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! Each repository owns a write lease and an immutable document snapshot.
//! Ingest takes the lease (waiting at most the configured timeout), builds the
//! next snapshot from a copy, and swaps it in. Readers clone the current
//! snapshot `Arc` and never block on writers. Repositories are independent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::HistoryDocument;
use crate::core::IngestStatus;
use crate::core::Run;
use crate::core::identifiers::RepoUrl;
use crate::core::identifiers::SuiteName;
use crate::core::validation::validate_ingest;
use crate::interfaces::HistoryError;
use crate::interfaces::HistoryStore;
use crate::interfaces::IngestReceipt;
use crate::interfaces::StorageError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default bound on waiting for a repository write lease.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
/// Retry hint attached to contention errors.
const CONTENTION_RETRY_AFTER_MS: u64 = 250;

// ============================================================================
// SECTION: Repository Log
// ============================================================================

/// Per-repository state.
#[derive(Debug)]
struct RepoLog {
    /// True while a lease is outstanding.
    busy: Mutex<bool>,
    /// Signalled when a lease is released.
    released: Condvar,
    /// Current immutable document.
    snapshot: RwLock<Arc<HistoryDocument>>,
}

impl RepoLog {
    /// Creates an empty log for `repo_url`.
    fn new(repo_url: RepoUrl) -> Self {
        Self {
            busy: Mutex::new(false),
            released: Condvar::new(),
            snapshot: RwLock::new(Arc::new(HistoryDocument::empty(repo_url))),
        }
    }

    /// Returns the current snapshot.
    fn snapshot(&self) -> Result<Arc<HistoryDocument>, HistoryError> {
        let guard = self.snapshot.read().map_err(|_| poisoned("snapshot"))?;
        Ok(Arc::clone(&guard))
    }

    /// Replaces the current snapshot.
    fn publish(&self, document: HistoryDocument) -> Result<(), HistoryError> {
        let mut guard = self.snapshot.write().map_err(|_| poisoned("snapshot"))?;
        *guard = Arc::new(document);
        Ok(())
    }
}

/// Exclusive write lease on one repository.
///
/// Ingests for the repository wait (up to the store's lock timeout) while a
/// lease is held. The lease is released on drop.
#[derive(Debug)]
pub struct RepositoryLease {
    /// Repository the lease covers.
    log: Arc<RepoLog>,
}

impl Drop for RepositoryLease {
    fn drop(&mut self) {
        let mut busy = self.log.busy.lock().unwrap_or_else(PoisonError::into_inner);
        *busy = false;
        drop(busy);
        self.log.released.notify_one();
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory history store.
#[derive(Debug, Clone)]
pub struct InMemoryHistoryStore {
    /// Repository logs keyed by repository identifier.
    repos: Arc<Mutex<BTreeMap<RepoUrl, Arc<RepoLog>>>>,
    /// Maximum wait for a repository write lease, in milliseconds.
    lock_timeout_ms: u64,
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHistoryStore {
    /// Creates an empty store with the default lock timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT_MS)
    }

    /// Creates an empty store with an explicit lock timeout.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout_ms: u64) -> Self {
        Self {
            repos: Arc::new(Mutex::new(BTreeMap::new())),
            lock_timeout_ms,
        }
    }

    /// Acquires the write lease for a repository, creating it when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Contention`] when the lease is not released
    /// within the lock timeout.
    pub fn lock_repository(&self, repo_url: &RepoUrl) -> Result<RepositoryLease, HistoryError> {
        let log = self.repo_log(repo_url)?;
        let busy = log.busy.lock().map_err(|_| poisoned("write lease"))?;
        let timeout = Duration::from_millis(self.lock_timeout_ms);
        let (mut busy, _) = log
            .released
            .wait_timeout_while(busy, timeout, |busy| *busy)
            .map_err(|_| poisoned("write lease"))?;
        if *busy {
            drop(busy);
            warn!(
                repo_url = %repo_url,
                timeout_ms = self.lock_timeout_ms,
                "repository write lease timed out"
            );
            return Err(HistoryError::Contention {
                message: format!(
                    "repository write lease not acquired within {} ms",
                    self.lock_timeout_ms
                ),
                retry_after_ms: Some(CONTENTION_RETRY_AFTER_MS),
            });
        }
        *busy = true;
        drop(busy);
        Ok(RepositoryLease {
            log,
        })
    }

    /// Returns the log for `repo_url`, creating an empty one when missing.
    fn repo_log(&self, repo_url: &RepoUrl) -> Result<Arc<RepoLog>, HistoryError> {
        let mut repos = self.repos.lock().map_err(|_| poisoned("repository map"))?;
        let log = repos
            .entry(repo_url.clone())
            .or_insert_with(|| Arc::new(RepoLog::new(repo_url.clone())));
        Ok(Arc::clone(log))
    }

    /// Returns the log for `repo_url` without creating it.
    fn existing_log(&self, repo_url: &RepoUrl) -> Result<Option<Arc<RepoLog>>, HistoryError> {
        let repos = self.repos.lock().map_err(|_| poisoned("repository map"))?;
        Ok(repos.get(repo_url).cloned())
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn ingest_with_status(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        mut run: Run,
    ) -> Result<IngestReceipt, HistoryError> {
        validate_ingest(repo_url, suite, &run)?;
        run.normalize_signed_zero();
        let lease = self.lock_repository(repo_url)?;
        let current = lease.log.snapshot()?;
        let commit_id = run.commit.id.clone();
        let mut next = HistoryDocument::clone(&current);
        let status = next.append(suite, run);
        match status {
            IngestStatus::Appended => {
                lease.log.publish(next.clone())?;
                info!(
                    repo_url = %repo_url,
                    suite = %suite,
                    commit_id = %commit_id,
                    last_update = next.last_update,
                    "benchmark run appended"
                );
            }
            IngestStatus::Duplicate => {
                debug!(
                    repo_url = %repo_url,
                    suite = %suite,
                    commit_id = %commit_id,
                    "benchmark run already recorded"
                );
            }
        }
        drop(lease);
        Ok(IngestReceipt {
            document: next,
            status,
        })
    }

    fn load(&self, repo_url: &RepoUrl) -> Result<HistoryDocument, HistoryError> {
        match self.existing_log(repo_url)? {
            Some(log) => {
                let snapshot = log.snapshot()?;
                Ok(HistoryDocument::clone(&snapshot))
            }
            None => Ok(HistoryDocument::empty(repo_url.clone())),
        }
    }

    fn readiness(&self) -> Result<(), HistoryError> {
        let repos = self.repos.lock().map_err(|_| poisoned("repository map"))?;
        drop(repos);
        Ok(())
    }
}

/// Builds the storage error reported for a poisoned lock.
fn poisoned(what: &str) -> HistoryError {
    HistoryError::Storage(StorageError::Io(format!("in-memory {what} lock poisoned")))
}
