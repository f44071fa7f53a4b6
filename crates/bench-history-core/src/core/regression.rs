// crates/bench-history-core/src/core/regression.rs
// ============================================================================
// Module: Bench History Regression Comparison
// Description: Compares the latest run of a suite against the previous run.
// Purpose: Flag measurements that worsened beyond an alert threshold.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A regression ratio is always "how many times worse": `previous / current`
//! for tools whose values grow when faster (throughput), `current / previous`
//! for everything else (durations). Ratios strictly above the threshold are
//! reported. Measurements absent from either run are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::history::Run;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default alert threshold (a measurement twice as bad as before).
pub const DEFAULT_ALERT_THRESHOLD: f64 = 2.0;

/// Tools that report bigger-is-better values.
const BIGGER_IS_BETTER_TOOLS: [&str; 3] = ["pytest", "benchmarkjs", "customBiggerIsBetter"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// A measurement that regressed beyond the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionAlert {
    /// Measurement name.
    pub name: String,
    /// Unit of the current measurement.
    pub unit: String,
    /// Value in the previous run.
    pub previous: f64,
    /// Value in the latest run.
    pub current: f64,
    /// Worsening ratio (greater than the threshold).
    pub ratio: f64,
}

/// Errors raised by regression comparison.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    /// Threshold is not a finite value greater than 1.
    #[error("alert threshold must be finite and greater than 1 (got {threshold})")]
    InvalidThreshold {
        /// Rejected threshold.
        threshold: f64,
    },
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Returns true when the tool's values improve as they grow.
#[must_use]
pub fn is_bigger_better(tool: &str) -> bool {
    BIGGER_IS_BETTER_TOOLS.contains(&tool)
}

/// Compares the last two runs of an append-ordered suite.
///
/// # Errors
///
/// Returns [`RegressionError::InvalidThreshold`] for a threshold that is not
/// finite or not greater than 1.
pub fn compare_latest(
    runs: &[Run],
    tool: &str,
    threshold: f64,
) -> Result<Vec<RegressionAlert>, RegressionError> {
    if !threshold.is_finite() || threshold <= 1.0 {
        return Err(RegressionError::InvalidThreshold {
            threshold,
        });
    }
    let [.., previous, current] = runs else {
        return Ok(Vec::new());
    };
    let bigger_is_better = is_bigger_better(tool);
    let mut alerts = Vec::new();
    for bench in &current.benches {
        let Some(prior) = previous.measurement(&bench.name) else {
            continue;
        };
        let ratio = if bigger_is_better {
            prior.value / bench.value
        } else {
            bench.value / prior.value
        };
        if ratio.is_nan() || ratio <= threshold {
            continue;
        }
        alerts.push(RegressionAlert {
            name: bench.name.clone(),
            unit: bench.unit.clone(),
            previous: prior.value,
            current: bench.value,
            ratio,
        });
    }
    Ok(alerts)
}
