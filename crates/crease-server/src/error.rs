// crates/crease-server/src/error.rs
// ============================================================================
// Module: API Error Mapping
// Description: Engine and infrastructure failures mapped to the wire taxonomy.
// Purpose: Give every failed request one stable shape with a correlation id.
// Dependencies: axum, crease-core, crease-protocol
// ============================================================================

//! ## Overview
//! The engine returns tagged errors; this module converts them into the wire
//! taxonomy and an HTTP response carrying `{code, message, details,
//! correlationId}`. Storage contention becomes `transient` so callers retry;
//! engine invariant breaches become `internal` so they do not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use crease_core::CorrelationId;
use crease_core::EngineError;
use crease_core::StoreError;
use crease_protocol::ErrorBody;
use crease_protocol::ErrorCode;

use crate::auth::AuthError;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// One failed request, ready to serialize.
#[derive(Debug)]
pub struct ApiError {
    /// Wire error body.
    pub body: ErrorBody,
}

impl ApiError {
    /// Builds an error from a code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>, correlation_id: CorrelationId) -> Self {
        Self {
            body: ErrorBody::new(code, message.into(), correlation_id),
        }
    }

    /// Builds a transient lock-timeout error.
    #[must_use]
    pub fn lock_timeout(correlation_id: CorrelationId) -> Self {
        Self::new(
            ErrorCode::Transient,
            "match is busy; retry the command",
            correlation_id,
        )
    }

    /// Maps an engine failure onto the taxonomy.
    #[must_use]
    pub fn from_engine(error: &EngineError, correlation_id: CorrelationId) -> Self {
        let (code, message) = match error {
            EngineError::InvalidArgument(message) => {
                (ErrorCode::InvalidArgument, message.clone())
            }
            EngineError::Legality(violation) => {
                (ErrorCode::InvalidArgument, violation.to_string())
            }
            EngineError::PermissionDenied(message) => {
                (ErrorCode::PermissionDenied, message.clone())
            }
            EngineError::NotFound(message) => (ErrorCode::NotFound, message.clone()),
            EngineError::FailedPrecondition(message) => {
                (ErrorCode::FailedPrecondition, message.clone())
            }
            EngineError::Lifecycle(violation) => {
                (ErrorCode::FailedPrecondition, violation.to_string())
            }
            EngineError::Conflict(message) => (ErrorCode::Conflict, message.clone()),
            EngineError::Store(store) => return Self::from_store(store, correlation_id),
            EngineError::Projector(_) | EngineError::Hash(_) => {
                (ErrorCode::Internal, String::from("internal scoring error"))
            }
        };
        Self::new(code, message, correlation_id)
    }

    /// Maps a storage failure onto the taxonomy.
    #[must_use]
    pub fn from_store(error: &StoreError, correlation_id: CorrelationId) -> Self {
        let (code, message) = match error {
            StoreError::Busy(_) => (
                ErrorCode::Transient,
                String::from("storage is busy; retry the command"),
            ),
            StoreError::Conflict(message) => (ErrorCode::Conflict, message.clone()),
            StoreError::Io(_)
            | StoreError::Corrupt(_)
            | StoreError::VersionMismatch(_)
            | StoreError::Invalid(_)
            | StoreError::Store(_) => {
                (ErrorCode::Internal, String::from("storage failure"))
            }
        };
        Self::new(code, message, correlation_id)
    }

    /// Maps an authentication failure onto the taxonomy.
    #[must_use]
    pub fn from_auth(error: &AuthError, correlation_id: CorrelationId) -> Self {
        Self::new(ErrorCode::Unauthenticated, error.to_string(), correlation_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.body.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}
