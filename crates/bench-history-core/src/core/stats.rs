// crates/bench-history-core/src/core/stats.rs
// ============================================================================
// Module: Bench History Stat Annotations
// Description: Read-only typed view over the free-text `range`/`extra` fields.
// Purpose: Expose standard deviation, mean, and round counts to consumers.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Measurements keep `range` and `extra` as opaque strings; they are stored
//! and served unchanged. [`StatAnnotation::parse`] recognises the pytest
//! layout (`stddev: <f64>` and `mean: <f64> <unit>\nrounds: <n>`) and leaves
//! any field it cannot read as `None`. Parsing never fails.

use std::time::Duration;

use crate::core::history::Measurement;

/// Typed statistics recovered from a measurement's annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatAnnotation {
    /// Standard deviation from `range`, in the harness's native unit.
    pub stddev: Option<f64>,
    /// Mean duration from `extra`.
    pub mean: Option<Duration>,
    /// Number of rounds from `extra`.
    pub rounds: Option<u64>,
}

impl StatAnnotation {
    /// Parses the annotations of a measurement.
    #[must_use]
    pub fn from_measurement(measurement: &Measurement) -> Self {
        Self::parse(measurement.range.as_deref(), measurement.extra.as_deref())
    }

    /// Parses raw `range` and `extra` text.
    #[must_use]
    pub fn parse(range: Option<&str>, extra: Option<&str>) -> Self {
        let stddev = range.and_then(parse_stddev);
        let mut mean = None;
        let mut rounds = None;
        for line in extra.unwrap_or_default().lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "mean" => mean = parse_duration(value),
                "rounds" => rounds = value.trim().parse().ok(),
                _ => {}
            }
        }
        Self {
            stddev,
            mean,
            rounds,
        }
    }
}

/// Reads `stddev: <f64>`.
fn parse_stddev(range: &str) -> Option<f64> {
    let value = range.trim().strip_prefix("stddev:")?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Reads `<f64> <unit>` where unit is one of `nsec`, `usec`, `msec`, `sec`.
fn parse_duration(text: &str) -> Option<Duration> {
    let mut parts = text.split_whitespace();
    let magnitude = parts.next()?.parse::<f64>().ok()?;
    let scale = match parts.next()? {
        "nsec" => 1e-9,
        "usec" => 1e-6,
        "msec" => 1e-3,
        "sec" => 1.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(magnitude * scale).ok()
}
