// crates/bench-history-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite History Store
// Description: Durable HistoryStore backend using SQLite WAL.
// Purpose: Persist benchmark runs for CI pipelines and dashboards.
// Dependencies: bench-history-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`bench_history_core::HistoryStore`]
//! that persists each run once, as canonical JSON with a content hash, in an
//! append-only log keyed by repository, suite, and commit. Documents are
//! assembled on read. Several processes may share one database file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::RepositorySummary;
pub use store::SqliteHistoryStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SuiteSummary;
