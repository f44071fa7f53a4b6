// crates/bench-history-core/src/core/mod.rs
// ============================================================================
// Module: Bench History Core Types
// Description: History document model, validation, codecs, and analysis helpers.
// Purpose: Provide stable, serializable types shared by every store and surface.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Core types describe benchmark runs and the per-repository history document
//! in the exact layout dashboards consume. Everything here is pure: no I/O,
//! no locking, no clocks.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod data_js;
pub mod hashing;
pub mod history;
pub mod identifiers;
pub mod pytest;
pub mod regression;
pub mod series;
pub mod stats;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use data_js::DATA_JS_PREFIX;
pub use data_js::DataJsError;
pub use data_js::decode_data_js;
pub use data_js::encode_data_js;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use history::Commit;
pub use history::CommitActor;
pub use history::HistoryDocument;
pub use history::IngestStatus;
pub use history::Measurement;
pub use history::Run;
pub use history::Suite;
pub use identifiers::CommitId;
pub use identifiers::RepoUrl;
pub use identifiers::SuiteName;
pub use pytest::ExtractError;
pub use pytest::PYTEST_TOOL;
pub use pytest::PytestBenchmarkReport;
pub use pytest::extract_pytest_measurements;
pub use pytest::parse_pytest_report;
pub use regression::DEFAULT_ALERT_THRESHOLD;
pub use regression::RegressionAlert;
pub use regression::RegressionError;
pub use regression::compare_latest;
pub use series::Series;
pub use series::SeriesIter;
pub use series::SeriesPoint;
pub use stats::StatAnnotation;
pub use validation::ValidationError;
pub use validation::validate_ingest;
