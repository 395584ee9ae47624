// crates/autonomy-kernel-core/src/core/hashing.rs
// ============================================================================
// Module: Autonomy Kernel Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Provide deterministic, prefixed digests for envelopes, outputs, and receipts.
// Dependencies: serde, serde_jcs, sha2, subtle
// ============================================================================

//! ## Overview
//! The kernel hashes all structured content as RFC 8785 (JCS) canonical JSON
//! so that semantically identical values always produce identical digests,
//! regardless of field order. Binary payloads are hashed directly.
//!
//! Digests travel across the wire as `sha256:<lowercase hex>`; the
//! [`HashDigest::prefixed`] and [`HashDigest::parse_prefixed`] helpers are the
//! only sanctioned way to produce and read that form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for kernel artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the wire prefix label for the algorithm.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// Default hash algorithm for the kernel.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Returns the `algorithm:hex` wire form (for example `sha256:ab12..`).
    #[must_use]
    pub fn prefixed(&self) -> String {
        format!("{}:{}", self.algorithm.label(), self.value)
    }

    /// Parses a `sha256:<hex>` digest string.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidDigest`] when the prefix is unknown or the
    /// hex body is not 64 lowercase hex characters.
    pub fn parse_prefixed(value: &str) -> Result<Self, HashError> {
        let Some(hex) = value.strip_prefix("sha256:") else {
            return Err(HashError::InvalidDigest(format!("unsupported digest prefix: {value}")));
        };
        let well_formed =
            hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(HashError::InvalidDigest(format!("malformed sha256 digest: {value}")));
        }
        Ok(Self {
            algorithm: HashAlgorithm::Sha256,
            value: hex.to_string(),
        })
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.label(), self.value)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// A digest string could not be parsed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
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

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Compares two digest strings without early exit on the first differing byte.
#[must_use]
pub fn digests_match(left: &str, right: &str) -> bool {
    left.len() == right.len() && bool::from(left.as_bytes().ct_eq(right.as_bytes()))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Decodes a hex string (either case) into bytes.
///
/// # Errors
///
/// Returns [`HashError::InvalidHex`] on odd length or non-hex characters.
pub fn hex_decode(value: &str) -> Result<Vec<u8>, HashError> {
    if !value.len().is_multiple_of(2) {
        return Err(HashError::InvalidHex("odd length".to_string()));
    }
    value
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| Ok((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?))
        .collect()
}

/// Decodes one hex character.
fn hex_nibble(byte: u8) -> Result<u8, HashError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(HashError::InvalidHex(format!("unexpected character '{}'", char::from(byte)))),
    }
}
