// crates/bench-history-core/src/runtime/import.rs
// ============================================================================
// Module: Bench History Document Import
// Description: Replays an existing history document into a store.
// Purpose: Seed a store from a published `data.js` artifact.
// Dependencies: crate::core, crate::interfaces, serde, tracing
// ============================================================================

//! ## Overview
//! Import ingests every run suite by suite, in each suite's append order, so
//! the target keeps the source ordering and its keep-first semantics. Runs
//! already present are counted as duplicates. The first failing run stops the
//! import; runs ingested before it stay ingested.

use serde::Serialize;
use tracing::info;

use crate::core::HistoryDocument;
use crate::core::IngestStatus;
use crate::core::identifiers::RepoUrl;
use crate::interfaces::HistoryError;
use crate::interfaces::HistoryStore;

/// Counts reported by [`import_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Suites visited.
    pub suites: usize,
    /// Runs appended to the store.
    pub appended: usize,
    /// Runs skipped because their commit was already recorded.
    pub duplicates: usize,
}

/// Ingests every run of `document` into `store`.
///
/// Runs are filed under `repo_override` when given, otherwise under the
/// document's own `repoUrl`.
///
/// # Errors
///
/// Returns the first [`HistoryError`] raised by the store.
pub fn import_document<S>(
    store: &S,
    document: &HistoryDocument,
    repo_override: Option<&RepoUrl>,
) -> Result<ImportSummary, HistoryError>
where
    S: HistoryStore + ?Sized,
{
    let repo_url = repo_override.unwrap_or(&document.repo_url);
    let mut summary = ImportSummary::default();
    for (suite, runs) in &document.entries {
        summary.suites += 1;
        for run in runs {
            match store.ingest_with_status(repo_url, suite, run.clone())?.status {
                IngestStatus::Appended => summary.appended += 1,
                IngestStatus::Duplicate => summary.duplicates += 1,
            }
        }
    }
    info!(
        repo_url = %repo_url,
        suites = summary.suites,
        appended = summary.appended,
        duplicates = summary.duplicates,
        "history document imported"
    );
    Ok(summary)
}
