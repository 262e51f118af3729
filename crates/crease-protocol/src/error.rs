// crates/crease-protocol/src/error.rs
// ============================================================================
// Module: Error Body
// Description: Error taxonomy and wire error shape for all API surfaces.
// Purpose: Give callers one stable error contract with correlation ids.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every failed request carries `{code, message, details, correlationId}`.
//! Codes form the fixed taxonomy callers branch on; the correlation id also
//! appears in the server's audit log so operators can join the two.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crease_core::CorrelationId;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed body, out-of-range enum, or field constraint violation.
    InvalidArgument,
    /// Missing, expired, or invalid credential.
    Unauthenticated,
    /// Authenticated caller lacks the role for this command on this match.
    PermissionDenied,
    /// Referenced entity is absent.
    NotFound,
    /// State machine violation.
    FailedPrecondition,
    /// Duplicate identity or idempotent resubmission.
    Conflict,
    /// Informational: the ball is pending consensus.
    Disputed,
    /// Retryable failure such as a lock timeout.
    Transient,
    /// Bug or unexpected storage failure; do not retry.
    Internal,
}

impl ErrorCode {
    /// HTTP status code the error maps to.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::Unauthenticated => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::FailedPrecondition | Self::Disputed => 422,
            Self::Transient => 503,
            Self::Internal => 500,
        }
    }
}

// ============================================================================
// SECTION: Error Body
// ============================================================================

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Correlation identifier also present in server logs.
    pub correlation_id: CorrelationId,
}

impl ErrorBody {
    /// Builds an error body without details.
    #[must_use]
    pub const fn new(code: ErrorCode, message: String, correlation_id: CorrelationId) -> Self {
        Self {
            code,
            message,
            details: None,
            correlation_id,
        }
    }
}
