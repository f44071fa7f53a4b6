// crates/bench-history-core/tests/in_memory_store.rs
// ============================================================================
// Module: In-Memory History Store Tests
// Description: Ingest, load, series, and locking behavior of the in-memory store.
// Purpose: Validate append-only history semantics end to end.
// Dependencies: bench-history-core
// ============================================================================
//! ## Overview
//! Exercises the in-memory store through the `HistoryStore` contract:
//! keep-first de-duplication, `lastUpdate` tracking, validation without
//! writes, bounded lock waits, and concurrent ingest.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;
use std::thread;

use bench_history_core::CommitId;
use bench_history_core::HistoryError;
use bench_history_core::HistoryStore;
use bench_history_core::InMemoryHistoryStore;
use bench_history_core::IngestStatus;
use bench_history_core::Measurement;
use bench_history_core::RepoUrl;
use bench_history_core::SuiteName;
use bench_history_core::ValidationError;
use common::READ_BENCH;
use common::read_run;
use common::repo;
use common::run;
use common::suite;

/// Verifies the two-commit scenario yields ordered runs and advancing lastUpdate.
#[test]
fn ingest_two_commits_appends_in_order() {
    let store = InMemoryHistoryStore::new();
    let bench = Measurement {
        name: "read[foo.svg]".to_string(),
        value: 1.2,
        unit: "iter/sec".to_string(),
        range: None,
        extra: None,
    };

    store.ingest(&repo(), &suite(), run("abc123", 1000, vec![bench.clone()])).unwrap();
    let document = store.load(&repo()).unwrap();
    assert_eq!(document.last_update, 1000);
    assert_eq!(document.suite(&suite()).unwrap().len(), 1);

    store.ingest(&repo(), &suite(), run("def456", 2000, vec![bench])).unwrap();
    let document = store.load(&repo()).unwrap();
    assert_eq!(document.last_update, 2000);
    let ids: Vec<&str> =
        document.suite(&suite()).unwrap().iter().map(|run| run.commit.id.as_str()).collect();
    assert_eq!(ids, vec!["abc123", "def456"]);
}

/// Verifies loading an unknown repository returns an empty document.
#[test]
fn load_unknown_repository_is_empty() {
    let store = InMemoryHistoryStore::new();
    let document = store.load(&RepoUrl::new("https://example.com/none")).unwrap();
    assert_eq!(document.last_update, 0);
    assert!(document.entries.is_empty());
    assert_eq!(document.repo_url.as_str(), "https://example.com/none");
}

/// Verifies re-ingesting a commit keeps the first run and leaves the document unchanged.
#[test]
fn duplicate_commit_keeps_first_run() {
    let store = InMemoryHistoryStore::new();
    let first = store.ingest_with_status(&repo(), &suite(), read_run("abc123", 1000, 4.0)).unwrap();
    assert_eq!(first.status, IngestStatus::Appended);

    let second =
        store.ingest_with_status(&repo(), &suite(), read_run("abc123", 5000, 9.0)).unwrap();
    assert_eq!(second.status, IngestStatus::Duplicate);
    assert_eq!(second.document, first.document);
    assert_eq!(store.load(&repo()).unwrap(), first.document);
}

/// Verifies the same commit may appear once in each suite.
#[test]
fn duplicate_detection_is_per_suite() {
    let store = InMemoryHistoryStore::new();
    let other = SuiteName::new("Other");
    store.ingest(&repo(), &suite(), read_run("abc123", 1000, 1.0)).unwrap();
    let receipt = store.ingest_with_status(&repo(), &other, read_run("abc123", 1500, 1.0)).unwrap();
    assert_eq!(receipt.status, IngestStatus::Appended);
    assert_eq!(receipt.document.run_count(), 2);
    assert_eq!(receipt.document.last_update, 1500);
}

/// Verifies lastUpdate tracks the maximum date even for out-of-order runs.
#[test]
fn last_update_is_max_date_for_out_of_order_runs() {
    let store = InMemoryHistoryStore::new();
    store.ingest(&repo(), &suite(), read_run("late", 3000, 1.0)).unwrap();
    let document = store.ingest(&repo(), &suite(), read_run("early", 1000, 1.0)).unwrap();
    assert_eq!(document.last_update, 3000);
    let ids: Vec<&str> =
        document.suite(&suite()).unwrap().iter().map(|run| run.commit.id.as_str()).collect();
    assert_eq!(ids, vec!["late", "early"]);
}

/// Verifies a missing commit id is rejected and nothing is written.
#[test]
fn missing_commit_id_is_rejected_without_write() {
    let store = InMemoryHistoryStore::new();
    store.ingest(&repo(), &suite(), read_run("abc123", 1000, 1.0)).unwrap();
    let before = store.load(&repo()).unwrap();

    let mut bad = read_run("", 2000, 1.0);
    bad.commit.id = CommitId::default();
    let err = store.ingest(&repo(), &suite(), bad).unwrap_err();
    assert_eq!(err, HistoryError::Validation(ValidationError::MissingCommitId));
    assert!(!err.is_retryable());
    assert_eq!(store.load(&repo()).unwrap(), before);
}

/// Verifies non-finite values and negative rates are rejected.
#[test]
fn malformed_measurements_are_rejected() {
    let store = InMemoryHistoryStore::new();
    let err = store.ingest(&repo(), &suite(), read_run("nan", 1000, f64::NAN)).unwrap_err();
    assert!(matches!(err, HistoryError::Validation(ValidationError::NonFiniteValue { .. })));

    let err = store.ingest(&repo(), &suite(), read_run("neg", 1000, -1.0)).unwrap_err();
    assert!(matches!(err, HistoryError::Validation(ValidationError::NegativeRate { .. })));

    let err = store.ingest(&repo(), &SuiteName::new(" "), read_run("ok", 1000, 1.0)).unwrap_err();
    assert_eq!(err, HistoryError::Validation(ValidationError::EmptySuiteName));

    let err = store.ingest(&RepoUrl::new(""), &suite(), read_run("ok", 1000, 1.0)).unwrap_err();
    assert_eq!(err, HistoryError::Validation(ValidationError::EmptyRepoUrl));

    let err = store.ingest(&repo(), &suite(), read_run("ok", -5, 1.0)).unwrap_err();
    assert_eq!(
        err,
        HistoryError::Validation(ValidationError::InvalidDate {
            date: -5
        })
    );
    assert!(store.load(&repo()).unwrap().is_empty());
}

/// Verifies negative values are accepted for non-rate units.
#[test]
fn negative_value_allowed_for_plain_units() {
    let store = InMemoryHistoryStore::new();
    let mut run = read_run("delta", 1000, 1.0);
    run.benches[0].unit = "ms".to_string();
    run.benches[0].value = -3.5;
    store.ingest(&repo(), &suite(), run).unwrap();
}

/// Verifies series yields append-ordered points and restarts on each iteration.
#[test]
fn series_yields_points_in_append_order() {
    let store = InMemoryHistoryStore::new();
    store.ingest(&repo(), &suite(), read_run("c1", 3000, 10.0)).unwrap();
    store.ingest(&repo(), &suite(), run("c2", 2000, Vec::new())).unwrap();
    store.ingest(&repo(), &suite(), read_run("c3", 1000, 30.0)).unwrap();

    let series = store.series(&repo(), &suite(), READ_BENCH).unwrap();
    let points: Vec<(i64, f64)> = series.iter().map(|point| (point.date, point.value)).collect();
    assert_eq!(points, vec![(3000, 10.0), (1000, 30.0)]);
    assert_eq!(series.iter().count(), 2);
    assert_eq!(series.iter().next().unwrap().range.as_deref(), Some("stddev: 0.1"));

    assert!(store.series(&repo(), &suite(), "unknown").unwrap().is_empty());
    assert!(store.series(&repo(), &SuiteName::new("none"), READ_BENCH).unwrap().is_empty());
}

/// Verifies a held repository lease makes ingest fail with retryable contention.
#[test]
fn held_lease_times_out_with_contention() {
    let store = InMemoryHistoryStore::with_lock_timeout(20);
    let lease = store.lock_repository(&repo()).unwrap();

    let err = store.ingest(&repo(), &suite(), read_run("abc123", 1000, 1.0)).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, HistoryError::Contention { .. }));

    let other = RepoUrl::new("https://github.com/other/repo");
    store.ingest(&other, &suite(), read_run("abc123", 1000, 1.0)).unwrap();

    drop(lease);
    store.ingest(&repo(), &suite(), read_run("abc123", 1000, 1.0)).unwrap();
    assert_eq!(store.load(&repo()).unwrap().run_count(), 1);
}

/// Verifies reads are served while a lease is held.
#[test]
fn load_does_not_wait_for_writers() {
    let store = InMemoryHistoryStore::with_lock_timeout(20);
    store.ingest(&repo(), &suite(), read_run("abc123", 1000, 1.0)).unwrap();
    let _lease = store.lock_repository(&repo()).unwrap();
    assert_eq!(store.load(&repo()).unwrap().run_count(), 1);
}

/// Verifies concurrent ingests from many threads lose no runs.
#[test]
fn concurrent_ingest_loses_no_runs() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for index in 0 .. 25 {
                    let id = format!("w{worker}-c{index}");
                    let date = i64::from(worker) * 1000 + i64::from(index);
                    store.ingest(&repo(), &suite(), read_run(&id, date, 1.0)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let document = store.load(&repo()).unwrap();
    assert_eq!(document.run_count(), 200);
    assert_eq!(document.last_update, 7024);
}

/// Verifies readiness succeeds on a healthy store.
#[test]
fn readiness_reports_ok() {
    InMemoryHistoryStore::new().readiness().unwrap();
}

/// Verifies negative zero is stored as positive zero, matching canonical JSON.
#[test]
fn negative_zero_is_stored_as_zero() {
    let store = InMemoryHistoryStore::new();
    store.ingest(&repo(), &suite(), read_run("abc123", 1000, -0.0)).unwrap();
    let document = store.load(&repo()).unwrap();
    let value = document.suite(&suite()).unwrap()[0].benches[0].value;
    assert_eq!(value.to_bits(), 0.0_f64.to_bits());
}
