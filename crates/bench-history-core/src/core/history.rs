// crates/bench-history-core/src/core/history.rs
// ============================================================================
// Module: Bench History Document Model
// Description: Runs, measurements, suites, and the persisted history document.
// Purpose: Define the wire-compatible `BENCHMARK_DATA` layout and append rules.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`HistoryDocument`] is the full snapshot for one repository: every suite
//! and its append-only run log. The serialized key names (`lastUpdate`,
//! `repoUrl`, `entries`, `commit`, `date`, `tool`, `benches`, ...) are fixed by
//! existing dashboard consumers and must not change.
//!
//! Invariants:
//! - Runs inside a suite are never removed or mutated once appended.
//! - A suite holds at most one run per commit id (first write wins).
//! - `last_update` equals the maximum `date` across all runs (0 when empty).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CommitId;
use crate::core::identifiers::RepoUrl;
use crate::core::identifiers::SuiteName;

// ============================================================================
// SECTION: Commit Descriptor
// ============================================================================

/// Author or committer attached to a commit descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActor {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Forge username, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Commit descriptor for the revision a run measured.
///
/// `id` defaults to empty when absent so that a missing id surfaces as a
/// validation failure at ingest rather than an opaque parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit author.
    pub author: CommitActor,
    /// Commit committer.
    pub committer: CommitActor,
    /// Whether the commit was distinct within its push event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    /// Commit identifier (de-duplication key).
    #[serde(default)]
    pub id: CommitId,
    /// Commit message.
    pub message: String,
    /// Commit timestamp as reported by the forge (RFC 3339 text).
    pub timestamp: String,
    /// Tree identifier, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    /// Link to the commit, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ============================================================================
// SECTION: Measurements and Runs
// ============================================================================

/// One named metric within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Test identifier, e.g. `tests/test_benchmarks.py::test_benchmark_read[a.svg]`.
    pub name: String,
    /// Measured value.
    pub value: f64,
    /// Unit of `value`, e.g. `iter/sec`.
    pub unit: String,
    /// Free-text secondary statistic, e.g. `stddev: 0.0123`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Free-text annotation; may contain embedded newlines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// One CI execution's benchmark results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Commit the run measured.
    pub commit: Commit,
    /// Wall-clock time the run was recorded (epoch milliseconds).
    pub date: i64,
    /// Measurement harness identifier, e.g. `pytest`.
    pub tool: String,
    /// Measurements in harness order.
    pub benches: Vec<Measurement>,
}

impl Run {
    /// Returns the measurement with the given name, if present.
    #[must_use]
    pub fn measurement(&self, name: &str) -> Option<&Measurement> {
        self.benches.iter().find(|bench| bench.name == name)
    }

    /// Rewrites `-0.0` values as `0.0`.
    ///
    /// Canonical JSON has no negative zero; stores apply this before
    /// persisting.
    pub fn normalize_signed_zero(&mut self) {
        for bench in &mut self.benches {
            if bench.value.to_bits() == (-0.0_f64).to_bits() {
                bench.value = 0.0;
            }
        }
    }
}

/// Append-only run log for one suite.
pub type Suite = Vec<Run>;

// ============================================================================
// SECTION: History Document
// ============================================================================

/// Result of appending a run to a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// The run was appended to the suite.
    Appended,
    /// A run with the same commit id already exists; the suite is unchanged.
    Duplicate,
}

/// Full persisted snapshot for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    /// Maximum run `date` across all suites (epoch milliseconds).
    pub last_update: i64,
    /// Owning repository.
    pub repo_url: RepoUrl,
    /// Suite name to append-only run log.
    pub entries: BTreeMap<SuiteName, Suite>,
}

impl HistoryDocument {
    /// Returns an empty document for the repository.
    #[must_use]
    pub const fn empty(repo_url: RepoUrl) -> Self {
        Self {
            last_update: 0,
            repo_url,
            entries: BTreeMap::new(),
        }
    }

    /// Assembles a document from per-suite run logs, deriving `last_update`.
    #[must_use]
    pub fn from_suites(repo_url: RepoUrl, entries: BTreeMap<SuiteName, Suite>) -> Self {
        let mut document = Self {
            last_update: 0,
            repo_url,
            entries,
        };
        document.last_update = document.max_date();
        document
    }

    /// Appends `run` to `suite` unless the suite already holds its commit id.
    ///
    /// Creates the suite when missing and keeps `last_update` current.
    pub fn append(&mut self, suite: &SuiteName, run: Run) -> IngestStatus {
        if self.contains_commit(suite, &run.commit.id) {
            return IngestStatus::Duplicate;
        }
        self.entries.entry(suite.clone()).or_default().push(run);
        self.last_update = self.max_date();
        IngestStatus::Appended
    }

    /// Returns true when `suite` already holds a run for `commit_id`.
    #[must_use]
    pub fn contains_commit(&self, suite: &SuiteName, commit_id: &CommitId) -> bool {
        self.entries
            .get(suite)
            .is_some_and(|runs| runs.iter().any(|run| run.commit.id == *commit_id))
    }

    /// Returns the run log for `suite`, if present.
    #[must_use]
    pub fn suite(&self, suite: &SuiteName) -> Option<&[Run]> {
        self.entries.get(suite).map(Vec::as_slice)
    }

    /// Returns the total number of runs across all suites.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns the maximum run date across all suites, or 0 when empty.
    #[must_use]
    pub fn max_date(&self) -> i64 {
        self.entries.values().flatten().map(|run| run.date).max().unwrap_or(0)
    }

    /// Returns true when no suite holds any run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}
