// crates/bench-history-core/src/core/hashing.rs
// ============================================================================
// Module: Bench History Canonical Hashing
// Description: RFC 8785 JSON canonicalization and run payload digests.
// Purpose: Give every stored run a stable digest so storage corruption is detected on read.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Stores persist runs as canonical JSON (RFC 8785 / JCS) alongside a
//! SHA-256 digest of those bytes. Loads recompute the digest and fail closed
//! on mismatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for stored payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable label persisted next to digests.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Parses a persisted label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Default hash algorithm for stored runs.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Content digest with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while producing canonical bytes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// Canonical output exceeded the caller's limit.
    #[error("canonical json exceeds size limit: {actual} bytes (max {limit})")]
    SizeLimitExceeded {
        /// Maximum allowed bytes.
        limit: usize,
        /// Actual canonical size.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Returns canonical JSON bytes, rejecting output larger than `max_bytes`.
///
/// # Errors
///
/// Returns [`HashError`] when serialization fails or the limit is exceeded.
pub fn canonical_json_bytes_with_limit<T: Serialize + ?Sized>(
    value: &T,
    max_bytes: usize,
) -> Result<Vec<u8>, HashError> {
    let bytes = canonical_json_bytes(value)?;
    if bytes.len() > max_bytes {
        return Err(HashError::SizeLimitExceeded {
            limit: max_bytes,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest {
                algorithm,
                value: hex_encode(&digest),
            }
        }
    }
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::DEFAULT_HASH_ALGORITHM;
    use super::HashAlgorithm;
    use super::hash_bytes;

    #[test]
    fn sha256_of_empty_input_matches_known_vector() {
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, b"");
        assert_eq!(
            digest.value,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn labels_round_trip() {
        assert_eq!(HashAlgorithm::from_label("sha256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::from_label("md5"), None);
    }
}
