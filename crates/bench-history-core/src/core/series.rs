// crates/bench-history-core/src/core/series.rs
// ============================================================================
// Module: Bench History Series View
// Description: Per-measurement trend view over a suite's run log.
// Purpose: Feed dashboards one `(date, value, range)` point per matching run.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Series`] owns a snapshot of one suite's runs and yields points lazily.
//! Each call to [`Series::iter`] restarts from the first run, so a series can
//! be walked any number of times. Runs without the measurement are skipped;
//! order is append order, not date order.

use serde::Serialize;

use crate::core::history::Run;

/// One point of a measurement's trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Run date (epoch milliseconds).
    pub date: i64,
    /// Measured value.
    pub value: f64,
    /// Free-text range annotation carried by the measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// Restartable trend view for one measurement in one suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Measurement name selected by this view.
    measurement: String,
    /// Suite snapshot in append order.
    runs: Vec<Run>,
}

impl Series {
    /// Creates a view over `runs` selecting `measurement`.
    #[must_use]
    pub fn new(measurement: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            measurement: measurement.into(),
            runs,
        }
    }

    /// Returns the selected measurement name.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Returns a fresh iterator starting at the first run.
    #[must_use]
    pub fn iter(&self) -> SeriesIter<'_> {
        SeriesIter {
            measurement: &self.measurement,
            runs: self.runs.iter(),
        }
    }

    /// Returns true when no run carries the measurement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = SeriesPoint;
    type IntoIter = SeriesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over series points.
#[derive(Debug, Clone)]
pub struct SeriesIter<'a> {
    /// Measurement name being selected.
    measurement: &'a str,
    /// Remaining runs.
    runs: std::slice::Iter<'a, Run>,
}

impl Iterator for SeriesIter<'_> {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let measurement = self.measurement;
        self.runs.find_map(|run| {
            run.measurement(measurement).map(|bench| SeriesPoint {
                date: run.date,
                value: bench.value,
                range: bench.range.clone(),
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.runs.len()))
    }
}
