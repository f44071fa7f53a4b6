// crates/bench-history-core/src/core/identifiers.rs
// ============================================================================
// Module: Bench History Identifiers
// Description: Opaque identifiers for repositories, suites, and commits.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings so the persisted
//! history layout stays byte-compatible with existing dashboard consumers.
//! Emptiness and length checks happen at ingest boundaries (see
//! [`crate::core::validation`]) rather than inside these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Repository identifier (usually the repository URL) owning a history document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoUrl(String);

impl RepoUrl {
    /// Creates a new repository identifier.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RepoUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RepoUrl {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Benchmark suite name (the key under `entries`, e.g. `"Benchmark"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteName(String);

impl SuiteName {
    /// Creates a new suite name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the suite name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SuiteName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SuiteName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Commit identifier used as the run de-duplication key within a suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Creates a new commit identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CommitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CommitId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
