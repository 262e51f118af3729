// crates/crease-core/src/core/hashing.rs
// ============================================================================
// Module: Crease Canonical Hashing
// Description: RFC 8785 JSON canonicalization, hash-chain links, and MAC signatures.
// Purpose: Provide deterministic digests for the append-only scoring event log.
// Dependencies: hmac, serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Crease hashes all canonical JSON using RFC 8785 (JCS) to guarantee stable,
//! replayable digests. Every scoring event links to its predecessor through
//! `chain_event_hash`, so tampering anywhere invalidates the suffix of the
//! log from that point forward. Scorer signatures are HMAC-SHA256 over the
//! canonical payload bytes keyed by the scorer's session credential; the
//! event store keeps them verbatim for audit and never interprets them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for Crease artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing (FIPS-friendly default).
    Sha256,
}

/// Default hash algorithm for Crease.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Sentinel prior hash for the first event of a match chain.
pub const CHAIN_SENTINEL: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

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
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

// ============================================================================
// SECTION: Event Chain
// ============================================================================

/// Computes the chained hash for a scoring event.
///
/// The link covers the prior event hash, the scorer identity, the event
/// timestamp in RFC 3339 form, and the canonical payload bytes. The first
/// event of a match uses [`CHAIN_SENTINEL`] as its prior hash.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the payload cannot be
/// canonicalized.
pub fn chain_event_hash<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    prior_hash: &str,
    scorer_id: UserId,
    event_timestamp: Timestamp,
    payload: &T,
) -> Result<HashDigest, HashError> {
    let payload_bytes = canonical_json_bytes(payload)?;
    let mut preimage =
        Vec::with_capacity(prior_hash.len() + 36 + 32 + payload_bytes.len());
    preimage.extend_from_slice(prior_hash.as_bytes());
    preimage.extend_from_slice(scorer_id.to_string().as_bytes());
    preimage.extend_from_slice(event_timestamp.to_rfc3339().as_bytes());
    preimage.extend_from_slice(&payload_bytes);
    Ok(hash_bytes(algorithm, &preimage))
}

// ============================================================================
// SECTION: Deterministic Identifiers
// ============================================================================

/// Derives a deterministic 128-bit identifier from labelled parts.
///
/// Replaying the same event log must reproduce the same dispute, consensus,
/// and canonical ball identifiers; random generation would break replay.
#[must_use]
pub fn derive_uuid(label: &str, parts: &[&str]) -> uuid::Uuid {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Uuid::from_bytes(bytes)
}

// ============================================================================
// SECTION: Payload Signatures
// ============================================================================

/// HMAC-SHA256 keyed by a scorer session credential.
type HmacSha256 = Hmac<Sha256>;

/// Signs canonical payload bytes with a scorer session credential.
///
/// Returns the lowercase hex MAC stored verbatim alongside the event.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the payload cannot be
/// canonicalized.
pub fn sign_payload<T: Serialize + ?Sized>(
    credential: &[u8],
    payload: &T,
) -> Result<String, HashError> {
    let payload_bytes = canonical_json_bytes(payload)?;
    let mut mac = HmacSha256::new_from_slice(credential)
        .map_err(|err| HashError::Canonicalization(err.to_string()))?;
    mac.update(&payload_bytes);
    Ok(hex_encode(&mac.finalize().into_bytes()))
}

/// Verifies a payload signature produced by [`sign_payload`].
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the payload cannot be
/// canonicalized.
pub fn verify_payload_signature<T: Serialize + ?Sized>(
    credential: &[u8],
    payload: &T,
    signature: &str,
) -> Result<bool, HashError> {
    let payload_bytes = canonical_json_bytes(payload)?;
    let Ok(mut mac) = HmacSha256::new_from_slice(credential) else {
        return Ok(false);
    };
    mac.update(&payload_bytes);
    let Ok(expected) = hex_decode(signature) else {
        return Ok(false);
    };
    Ok(mac.verify_slice(&expected).is_ok())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Decodes a lowercase or uppercase hex string into bytes.
fn hex_decode(value: &str) -> Result<Vec<u8>, ()> {
    if value.len() % 2 != 0 {
        return Err(());
    }
    let digits = value.as_bytes();
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let high = hex_digit(pair[0]).ok_or(())?;
        let low = hex_digit(pair[1]).ok_or(())?;
        out.push((high << 4) | low);
    }
    Ok(out)
}

/// Returns the value of a single hex digit.
const fn hex_digit(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
