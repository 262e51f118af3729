// crates/crease-server/src/auth.rs
// ============================================================================
// Module: Session Authentication
// Description: Bearer-token session registry and per-request auth context.
// Purpose: Resolve verified caller identities with fail-closed checks.
// Dependencies: crease-core, subtle
// ============================================================================

//! ## Overview
//! Token issuance is an external collaborator; this module only maps seeded
//! bearer tokens to verified identities. Lookups compare tokens in constant
//! time, successful requests carry an [`AuthContext`] with the caller
//! identity and a hashed token fingerprint for audit, and every failure is
//! an `unauthenticated` error. The session credential also keys the
//! HMAC signatures attached to scoring events at ingress.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crease_core::UserId;
use crease_core::hashing::HashAlgorithm;
use crease_core::hashing::hash_bytes;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::SessionSeed;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound on accepted authorization header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authenticated caller context for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Verified caller identity.
    pub user_id: UserId,
    /// Session credential bytes, keying event signatures.
    pub credential: Vec<u8>,
    /// Token fingerprint for audit (sha256, hex).
    pub token_fingerprint: String,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Session Registry
// ============================================================================

/// In-memory session registry seeded from configuration.
pub struct SessionRegistry {
    /// Seeded sessions.
    sessions: Vec<SessionSeed>,
}

impl SessionRegistry {
    /// Builds a registry from seeded sessions.
    #[must_use]
    pub const fn new(sessions: Vec<SessionSeed>) -> Self {
        Self {
            sessions,
        }
    }

    /// Authenticates a bearer token value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the token is unknown.
    pub fn authenticate_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let token_bytes = token.as_bytes();
        let matched = self.sessions.iter().find(|seed| {
            let seed_bytes = seed.token.as_bytes();
            seed_bytes.len() == token_bytes.len()
                && bool::from(seed_bytes.ct_eq(token_bytes))
        });
        let Some(seed) = matched else {
            return Err(AuthError::Unauthenticated(String::from("invalid session token")));
        };
        let digest = hash_bytes(HashAlgorithm::Sha256, token_bytes);
        Ok(AuthContext {
            user_id: seed.user_id,
            credential: token_bytes.to_vec(),
            token_fingerprint: digest.value,
        })
    }

    /// Authenticates an `Authorization: Bearer` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] on missing, oversized, or
    /// malformed headers and on unknown tokens.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = parse_bearer_token(header)?;
        self.authenticate_token(&token)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the token from a bearer authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated(String::from("missing authorization")))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated(String::from(
            "authorization header too large",
        )));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated(String::from("invalid authorization header")));
    }
    Ok(token.to_string())
}
