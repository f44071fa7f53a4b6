// crates/bench-history-core/src/core/validation.rs
// ============================================================================
// Module: Bench History Ingest Validation
// Description: Structural checks applied to runs before any write.
// Purpose: Reject malformed runs so no store persists them.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`validate_ingest`] is the single gate every store runs before touching
//! storage. A run that fails here must never reach a persisted document.
//! Error messages name the offending field but never echo whole payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::history::Run;
use crate::core::identifiers::RepoUrl;
use crate::core::identifiers::SuiteName;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum repository identifier length in bytes.
pub const MAX_REPO_URL_LENGTH: usize = 2048;
/// Maximum suite name length in bytes.
pub const MAX_SUITE_NAME_LENGTH: usize = 256;
/// Maximum commit id length in bytes.
pub const MAX_COMMIT_ID_LENGTH: usize = 256;
/// Maximum measurement name length in bytes.
pub const MAX_MEASUREMENT_NAME_LENGTH: usize = 4096;
/// Maximum number of measurements in one run.
pub const MAX_MEASUREMENTS_PER_RUN: usize = 10_000;
/// Maximum canonical JSON size of one run.
pub const MAX_RUN_BYTES: usize = 8 * 1024 * 1024;
/// Latest accepted run date: 9999-12-31T23:59:59.999Z in epoch milliseconds.
pub const MAX_EPOCH_MILLIS: i64 = 253_402_300_799_999;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural validation failures for an ingest request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Repository identifier is empty.
    #[error("repository url must be non-empty")]
    EmptyRepoUrl,
    /// Repository identifier exceeds the length limit.
    #[error("repository url exceeds {max} bytes")]
    RepoUrlTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Suite name is empty.
    #[error("suite name must be non-empty")]
    EmptySuiteName,
    /// Suite name exceeds the length limit.
    #[error("suite name exceeds {max} bytes")]
    SuiteNameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Run has no commit id.
    #[error("run commit id is missing")]
    MissingCommitId,
    /// Commit id exceeds the length limit.
    #[error("commit id exceeds {max} bytes")]
    CommitIdTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Run date is not a valid epoch-millisecond timestamp.
    #[error("run date {date} is not a valid epoch-millisecond timestamp")]
    InvalidDate {
        /// Rejected date value.
        date: i64,
    },
    /// Run carries too many measurements.
    #[error("run has {count} measurements (max {max})")]
    TooManyMeasurements {
        /// Number of measurements supplied.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A measurement has an empty or overlong name.
    #[error("measurement #{index} has an empty or overlong name")]
    InvalidMeasurementName {
        /// Position of the measurement inside the run.
        index: usize,
    },
    /// Two measurements in one run share a name.
    #[error("duplicate measurement name in run: {name}")]
    DuplicateMeasurement {
        /// Repeated name.
        name: String,
    },
    /// A measurement value is NaN or infinite.
    #[error("measurement {name} has a non-finite value")]
    NonFiniteValue {
        /// Offending measurement name.
        name: String,
    },
    /// A rate-style measurement is negative.
    #[error("measurement {name} has a negative value for rate unit {unit}")]
    NegativeRate {
        /// Offending measurement name.
        name: String,
        /// Rate unit of the measurement.
        unit: String,
    },
    /// Serialized run exceeds the size limit.
    #[error("run exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates the repository, suite, and run of an ingest request.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_ingest(
    repo_url: &RepoUrl,
    suite: &SuiteName,
    run: &Run,
) -> Result<(), ValidationError> {
    validate_repo_url(repo_url)?;
    validate_suite_name(suite)?;
    validate_run(run)
}

/// Validates a repository identifier.
///
/// # Errors
///
/// Returns [`ValidationError`] when the identifier is blank or overlong.
pub fn validate_repo_url(repo_url: &RepoUrl) -> Result<(), ValidationError> {
    if repo_url.as_str().trim().is_empty() {
        return Err(ValidationError::EmptyRepoUrl);
    }
    if repo_url.as_str().len() > MAX_REPO_URL_LENGTH {
        return Err(ValidationError::RepoUrlTooLong {
            max: MAX_REPO_URL_LENGTH,
        });
    }
    Ok(())
}

/// Validates a suite name.
///
/// # Errors
///
/// Returns [`ValidationError`] when the name is blank or overlong.
pub fn validate_suite_name(suite: &SuiteName) -> Result<(), ValidationError> {
    if suite.as_str().trim().is_empty() {
        return Err(ValidationError::EmptySuiteName);
    }
    if suite.as_str().len() > MAX_SUITE_NAME_LENGTH {
        return Err(ValidationError::SuiteNameTooLong {
            max: MAX_SUITE_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Validates the structure of a run.
///
/// # Errors
///
/// Returns [`ValidationError`] for a missing commit id, an out-of-range date,
/// or any malformed measurement.
pub fn validate_run(run: &Run) -> Result<(), ValidationError> {
    if run.commit.id.is_blank() {
        return Err(ValidationError::MissingCommitId);
    }
    if run.commit.id.as_str().len() > MAX_COMMIT_ID_LENGTH {
        return Err(ValidationError::CommitIdTooLong {
            max: MAX_COMMIT_ID_LENGTH,
        });
    }
    if !(0 ..= MAX_EPOCH_MILLIS).contains(&run.date) {
        return Err(ValidationError::InvalidDate {
            date: run.date,
        });
    }
    if run.benches.len() > MAX_MEASUREMENTS_PER_RUN {
        return Err(ValidationError::TooManyMeasurements {
            count: run.benches.len(),
            max: MAX_MEASUREMENTS_PER_RUN,
        });
    }
    let mut seen = BTreeSet::new();
    for (index, bench) in run.benches.iter().enumerate() {
        if bench.name.trim().is_empty() || bench.name.len() > MAX_MEASUREMENT_NAME_LENGTH {
            return Err(ValidationError::InvalidMeasurementName {
                index,
            });
        }
        if !seen.insert(bench.name.as_str()) {
            return Err(ValidationError::DuplicateMeasurement {
                name: bench.name.clone(),
            });
        }
        if !bench.value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                name: bench.name.clone(),
            });
        }
        if is_rate_unit(&bench.unit) && bench.value < 0.0 {
            return Err(ValidationError::NegativeRate {
                name: bench.name.clone(),
                unit: bench.unit.clone(),
            });
        }
    }
    Ok(())
}

/// Returns true for ratio units such as `iter/sec`, `ops/s`, or `ns/iter`.
#[must_use]
pub fn is_rate_unit(unit: &str) -> bool {
    unit.contains('/')
}

// ============================================================================
// SECTION: Tests
// ============================================================================
