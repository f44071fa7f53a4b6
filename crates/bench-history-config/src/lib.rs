// crates/bench-history-config/src/lib.rs
// ============================================================================
// Module: Bench History Config
// Description: Configuration model and validation for bench history tools.
// Purpose: Single source of truth for bench-history.toml semantics.
// Dependencies: bench-history-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Typed `bench-history.toml` model with fail-closed validation, shared by
//! the CLI and any embedding service.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
