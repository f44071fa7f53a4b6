// crates/bench-history-core/src/runtime/mod.rs
// ============================================================================
// Module: Bench History Runtime
// Description: In-memory store and store-level workflows.
// Purpose: Run history semantics against any `HistoryStore`.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Runtime modules hold the in-process store and workflows that drive a store
//! through the [`crate::interfaces::HistoryStore`] contract.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod import;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use import::ImportSummary;
pub use import::import_document;
pub use store::DEFAULT_LOCK_TIMEOUT_MS;
pub use store::InMemoryHistoryStore;
pub use store::RepositoryLease;
