// crates/bench-history-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared run and measurement builders for core tests.
// Purpose: Keep fixtures consistent across integration test files.
// Dependencies: bench-history-core
// ============================================================================

//! ## Overview
//! Builders for commits, measurements, and runs shaped like the runs a
//! pytest-benchmark CI job produces.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use bench_history_core::Commit;
use bench_history_core::CommitActor;
use bench_history_core::CommitId;
use bench_history_core::Measurement;
use bench_history_core::RepoUrl;
use bench_history_core::Run;
use bench_history_core::SuiteName;

pub const REPO: &str = "https://github.com/abey79/vpype";
pub const SUITE: &str = "Benchmark";
pub const READ_BENCH: &str = "tests/test_benchmarks.py::test_benchmark_read[a.svg]";

pub fn repo() -> RepoUrl {
    RepoUrl::new(REPO)
}

pub fn suite() -> SuiteName {
    SuiteName::new(SUITE)
}

pub fn actor() -> CommitActor {
    CommitActor {
        name: "Antoine Beyeler".to_string(),
        username: Some("abey79".to_string()),
        email: Some("abey79@gmail.com".to_string()),
    }
}

pub fn commit(id: &str) -> Commit {
    Commit {
        author: actor(),
        committer: actor(),
        distinct: Some(true),
        id: CommitId::new(id),
        message: format!("commit {id}"),
        timestamp: "2021-03-19T13:49:48+01:00".to_string(),
        tree_id: None,
        url: Some(format!("https://github.com/abey79/vpype/commit/{id}")),
    }
}

pub fn measurement(name: &str, value: f64) -> Measurement {
    Measurement {
        name: name.to_string(),
        value,
        unit: "iter/sec".to_string(),
        range: Some(format!("stddev: {}", value / 100.0)),
        extra: Some("mean: 969.2870029999999 msec\nrounds: 5".to_string()),
    }
}

pub fn run(commit_id: &str, date: i64, benches: Vec<Measurement>) -> Run {
    Run {
        commit: commit(commit_id),
        date,
        tool: "pytest".to_string(),
        benches,
    }
}

pub fn read_run(commit_id: &str, date: i64, value: f64) -> Run {
    run(commit_id, date, vec![measurement(READ_BENCH, value)])
}
