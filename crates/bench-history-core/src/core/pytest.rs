// crates/bench-history-core/src/core/pytest.rs
// ============================================================================
// Module: pytest-benchmark Extraction
// Description: Converts pytest-benchmark JSON reports into measurements.
// Purpose: Produce the exact `value`/`unit`/`range`/`extra` layout dashboards expect.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! pytest-benchmark reports carry per-test statistics in seconds. Each test
//! becomes one [`Measurement`]:
//! - `name`: the test's `fullname`
//! - `value`: `stats.ops`, unit `iter/sec`
//! - `range`: `stddev: <stats.stddev>`
//! - `extra`: `mean: <scaled mean> <unit>\nrounds: <stats.rounds>`
//!
//! Unknown report fields are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;

use crate::core::history::Measurement;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tool identifier recorded on runs extracted from pytest-benchmark.
pub const PYTEST_TOOL: &str = "pytest";
/// Unit recorded for pytest-benchmark throughput values.
pub const PYTEST_UNIT: &str = "iter/sec";
/// Maximum accepted report size in bytes.
pub const MAX_PYTEST_REPORT_BYTES: usize = 32 * 1024 * 1024;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Subset of a pytest-benchmark JSON report used for extraction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PytestBenchmarkReport {
    /// Benchmarked tests in report order.
    pub benchmarks: Vec<PytestBenchmark>,
}

/// One benchmarked test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PytestBenchmark {
    /// Fully qualified test id, including any parametrization suffix.
    pub fullname: String,
    /// Timing statistics.
    pub stats: PytestStats,
}

/// Timing statistics for one test (seconds unless noted).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PytestStats {
    /// Operations per second.
    pub ops: f64,
    /// Standard deviation of round times.
    pub stddev: f64,
    /// Mean round time.
    pub mean: f64,
    /// Number of rounds executed.
    pub rounds: u64,
}

/// Errors raised while reading a pytest-benchmark report.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Report exceeded the size limit.
    #[error("pytest report exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual report size.
        actual_bytes: usize,
    },
    /// Report is not valid pytest-benchmark JSON.
    #[error("invalid pytest report: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Parses a pytest-benchmark JSON report.
///
/// # Errors
///
/// Returns [`ExtractError`] when the report is oversized or malformed.
pub fn parse_pytest_report(bytes: &[u8]) -> Result<PytestBenchmarkReport, ExtractError> {
    if bytes.len() > MAX_PYTEST_REPORT_BYTES {
        return Err(ExtractError::TooLarge {
            max_bytes: MAX_PYTEST_REPORT_BYTES,
            actual_bytes: bytes.len(),
        });
    }
    serde_json::from_slice(bytes).map_err(|err| ExtractError::Parse(err.to_string()))
}

/// Converts every benchmark in the report into a measurement.
#[must_use]
pub fn extract_pytest_measurements(report: &PytestBenchmarkReport) -> Vec<Measurement> {
    report
        .benchmarks
        .iter()
        .map(|bench| {
            let (mean, mean_unit) = human_readable_seconds(bench.stats.mean);
            Measurement {
                name: bench.fullname.clone(),
                value: bench.stats.ops,
                unit: PYTEST_UNIT.to_string(),
                range: Some(format!("stddev: {}", bench.stats.stddev)),
                extra: Some(format!("mean: {mean} {mean_unit}\nrounds: {}", bench.stats.rounds)),
            }
        })
        .collect()
}

/// Scales a duration in seconds to `nsec`, `usec`, `msec`, or `sec`.
#[must_use]
pub fn human_readable_seconds(seconds: f64) -> (f64, &'static str) {
    if seconds < 1.0e-6 {
        (seconds * 1e9, "nsec")
    } else if seconds < 1.0e-3 {
        (seconds * 1e6, "usec")
    } else if seconds < 1.0 {
        (seconds * 1e3, "msec")
    } else {
        (seconds, "sec")
    }
}
