// crates/bench-history-core/src/interfaces/mod.rs
// ============================================================================
// Module: Bench History Interfaces
// Description: Backend-agnostic history store contract and error taxonomy.
// Purpose: Let the CLI and import tooling work against any persistence backend.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`HistoryStore`] is the seam between benchmark history semantics and
//! persistence. Every implementation must:
//! - validate before writing and persist nothing on validation failure
//! - serialize ingests per repository with a bounded wait
//! - treat a repeated commit id within a suite as a no-op (first write wins)
//! - serve reads from a consistent snapshot

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::HistoryDocument;
use crate::core::IngestStatus;
use crate::core::Run;
use crate::core::Series;
use crate::core::ValidationError;
use crate::core::identifiers::RepoUrl;
use crate::core::identifiers::SuiteName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Persistence failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("history store io error: {0}")]
    Io(String),
    /// Persisted data failed integrity checks.
    #[error("history store corruption: {0}")]
    Corrupt(String),
    /// Persisted data has an incompatible schema version.
    #[error("history store version mismatch: {0}")]
    VersionMismatch(String),
    /// Storage engine reported an error.
    #[error("history store error: {0}")]
    Backend(String),
}

/// Errors returned by [`HistoryStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The run was rejected; nothing was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The repository lock could not be acquired in time; retryable.
    #[error("history store contention: {message}")]
    Contention {
        /// Description of the contended resource.
        message: String,
        /// Suggested retry delay in milliseconds.
        retry_after_ms: Option<u64>,
    },
}

impl HistoryError {
    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention { .. })
    }
}

// ============================================================================
// SECTION: History Store
// ============================================================================

/// Outcome of an ingest: the post-ingest document and what happened to the run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReceipt {
    /// Repository document after the ingest.
    pub document: HistoryDocument,
    /// Whether the run was appended or ignored as a duplicate.
    pub status: IngestStatus,
}

/// Append-only benchmark history persistence.
pub trait HistoryStore {
    /// Appends a run to a suite and reports whether it was a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Validation`] for malformed input (nothing is
    /// written), [`HistoryError::Contention`] when the repository lock times
    /// out, and [`HistoryError::Storage`] for persistence failures.
    fn ingest_with_status(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        run: Run,
    ) -> Result<IngestReceipt, HistoryError>;

    /// Returns the repository document, or an empty one when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] when reading fails.
    fn load(&self, repo_url: &RepoUrl) -> Result<HistoryDocument, HistoryError>;

    /// Appends a run to a suite and returns the updated document.
    ///
    /// # Errors
    ///
    /// See [`HistoryStore::ingest_with_status`].
    fn ingest(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        run: Run,
    ) -> Result<HistoryDocument, HistoryError> {
        Ok(self.ingest_with_status(repo_url, suite, run)?.document)
    }

    /// Returns one suite's runs in append order (empty when unknown).
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] when reading fails.
    fn suite_runs(&self, repo_url: &RepoUrl, suite: &SuiteName) -> Result<Vec<Run>, HistoryError> {
        let mut document = self.load(repo_url)?;
        Ok(document.entries.remove(suite).unwrap_or_default())
    }

    /// Returns the trend of one measurement within a suite.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] when reading fails.
    fn series(
        &self,
        repo_url: &RepoUrl,
        suite: &SuiteName,
        measurement: &str,
    ) -> Result<Series, HistoryError> {
        Ok(Series::new(measurement, self.suite_runs(repo_url, suite)?))
    }

    /// Reports store readiness for health probes.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] when the store is unavailable.
    fn readiness(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}
