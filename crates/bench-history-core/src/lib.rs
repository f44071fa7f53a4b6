// crates/bench-history-core/src/lib.rs
// ============================================================================
// Module: Bench History Core Library
// Description: Public API surface for the benchmark history store.
// Purpose: Expose the history model, the store contract, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Bench history records one benchmark run per CI execution into an
//! append-only, per-(repository, suite) log and serves the cumulative
//! `BENCHMARK_DATA` document and per-measurement trends to dashboards.
//! Persistence is pluggable through [`HistoryStore`]; this crate ships the
//! in-memory implementation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::HistoryError;
pub use interfaces::HistoryStore;
pub use interfaces::IngestReceipt;
pub use interfaces::StorageError;
pub use runtime::DEFAULT_LOCK_TIMEOUT_MS;
pub use runtime::ImportSummary;
pub use runtime::InMemoryHistoryStore;
pub use runtime::RepositoryLease;
pub use runtime::import_document;
