// crates/bench-history-core/src/core/data_js.rs
// ============================================================================
// Module: Bench History data.js Codec
// Description: Encodes and decodes the `window.BENCHMARK_DATA` dashboard artifact.
// Purpose: Interoperate with dashboards and artifacts published by CI.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Dashboards load history from a JavaScript file that assigns the document
//! to a global: `window.BENCHMARK_DATA = { ... }`. Encoding emits that prefix
//! followed by two-space indented JSON. Decoding is lenient about the wrapper
//! (prefix, trailing `;`, or bare JSON) and strict about the document.
//!
//! Decoded documents are normalized: `lastUpdate` is recomputed from the run
//! dates, since published artifacts often carry the publish wall-clock time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::history::HistoryDocument;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Assignment prefix of the dashboard artifact.
pub const DATA_JS_PREFIX: &str = "window.BENCHMARK_DATA = ";
/// Maximum accepted artifact size in bytes.
pub const MAX_DATA_JS_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the data.js codec.
#[derive(Debug, Error)]
pub enum DataJsError {
    /// Artifact exceeded the size limit.
    #[error("data.js exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual artifact size.
        actual_bytes: usize,
    },
    /// Artifact body is not a valid history document.
    #[error("invalid data.js document: {0}")]
    Parse(String),
    /// Document could not be serialized.
    #[error("failed to serialize history document: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Renders a document as a `data.js` artifact.
///
/// # Errors
///
/// Returns [`DataJsError::Serialize`] when JSON serialization fails.
pub fn encode_data_js(document: &HistoryDocument) -> Result<String, DataJsError> {
    let body = serde_json::to_string_pretty(document)
        .map_err(|err| DataJsError::Serialize(err.to_string()))?;
    let mut out = String::with_capacity(DATA_JS_PREFIX.len() + body.len());
    out.push_str(DATA_JS_PREFIX);
    out.push_str(&body);
    Ok(out)
}

/// Parses a `data.js` artifact or a bare JSON history document.
///
/// # Errors
///
/// Returns [`DataJsError`] when the input is oversized or malformed.
pub fn decode_data_js(text: &str) -> Result<HistoryDocument, DataJsError> {
    if text.len() > MAX_DATA_JS_BYTES {
        return Err(DataJsError::TooLarge {
            max_bytes: MAX_DATA_JS_BYTES,
            actual_bytes: text.len(),
        });
    }
    let body = strip_wrapper(text);
    let document: HistoryDocument =
        serde_json::from_str(body).map_err(|err| DataJsError::Parse(err.to_string()))?;
    Ok(HistoryDocument::from_suites(document.repo_url, document.entries))
}

/// Removes the assignment prefix and trailing semicolon when present.
fn strip_wrapper(text: &str) -> &str {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("window.BENCHMARK_DATA")
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .unwrap_or(trimmed);
    let body = body.trim();
    body.strip_suffix(';').unwrap_or(body).trim_end()
}
