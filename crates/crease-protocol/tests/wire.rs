// crates/crease-protocol/tests/wire.rs
// ============================================================================
// Module: Wire Contract Tests
// Description: Tests for command bodies, stream envelopes, and error shapes.
// ============================================================================
//! ## Overview
//! Pins the wire contract: camel-case command fields, decimal ball
//! coordinates, the `{type, timestamp, data}` stream envelope with its
//! stable kind names, and the error taxonomy's HTTP mapping.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use crease_core::BallSubmission;
use crease_core::CorrelationId;
use crease_core::ExtraKind;
use crease_core::InningsId;
use crease_core::OverId;
use crease_core::Timestamp;
use crease_protocol::BallSubmit;
use crease_protocol::ErrorBody;
use crease_protocol::ErrorCode;
use crease_protocol::StreamMessage;
use crease_protocol::StreamMessageKind;
use serde_json::json;

/// A ball submission parses from the documented camel-case body.
#[test]
fn ball_submit_parses_the_documented_body() {
    let innings_id = InningsId::generate();
    let over_id = OverId::generate();
    let body = json!({
        "inningsId": innings_id,
        "overId": over_id,
        "ballNumber": "15.4",
        "bowlerId": crease_core::PlayerId::generate(),
        "strikerId": crease_core::PlayerId::generate(),
        "runsOffBat": 4,
        "isBoundary": true,
        "boundaryKind": "four",
        "isLegal": true,
        "extraKind": "none",
        "extraRuns": 0,
    });
    let submit: BallSubmit = serde_json::from_value(body).unwrap();
    assert_eq!(submit.ball_number.over, 15);
    assert_eq!(submit.ball_number.ball_in_over, 4);
    assert_eq!(submit.extra_kind, ExtraKind::None);
    assert!(!submit.is_wicket);

    let submission = BallSubmission::from(submit);
    assert_eq!(submission.outcome.runs_off_bat, 4);
    assert!(submission.outcome.is_boundary);
}

/// Wide bodies default the optional fields.
#[test]
fn ball_submit_defaults_optional_fields() {
    let body = json!({
        "inningsId": InningsId::generate(),
        "overId": OverId::generate(),
        "ballNumber": "1.3",
        "bowlerId": crease_core::PlayerId::generate(),
        "strikerId": crease_core::PlayerId::generate(),
        "runsOffBat": 0,
        "isLegal": false,
        "extraKind": "wide",
        "extraRuns": 1,
    });
    let submit: BallSubmit = serde_json::from_value(body).unwrap();
    assert!(!submit.is_wicket);
    assert!(!submit.is_boundary);
    assert_eq!(submit.extra_kind, ExtraKind::Wide);
    assert_eq!(submit.extra_runs, 1);
}

/// Stream frames carry `type`, `timestamp`, and `data`.
#[test]
fn stream_envelope_uses_the_stable_field_names() {
    let frame = StreamMessage::error("boom", Timestamp::from_unix_millis_saturating(0));
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value["type"], "Error");
    assert!(value["timestamp"].is_string());
    assert_eq!(value["data"]["message"], "boom");
}

/// Message kind names are the stable wire identifiers.
#[test]
fn stream_kind_names_are_stable() {
    for (kind, expected) in [
        (StreamMessageKind::ConnectionEstablished, "\"ConnectionEstablished\""),
        (StreamMessageKind::BallBowled, "\"BallBowled\""),
        (StreamMessageKind::WicketFallen, "\"WicketFallen\""),
        (StreamMessageKind::OverComplete, "\"OverComplete\""),
        (StreamMessageKind::InningsComplete, "\"InningsComplete\""),
        (StreamMessageKind::MatchComplete, "\"MatchComplete\""),
        (StreamMessageKind::PlayerChanged, "\"PlayerChanged\""),
        (StreamMessageKind::MilestoneAchieved, "\"MilestoneAchieved\""),
        (StreamMessageKind::ScoringDisputeRaised, "\"ScoringDisputeRaised\""),
        (StreamMessageKind::DisputeResolved, "\"DisputeResolved\""),
        (StreamMessageKind::Reconciliation, "\"Reconciliation\""),
        (StreamMessageKind::Error, "\"Error\""),
    ] {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
    }
}

/// Error bodies serialize the documented shape with the correlation id.
#[test]
fn error_body_carries_the_correlation_id() {
    let correlation_id = CorrelationId::generate();
    let body = ErrorBody::new(
        ErrorCode::FailedPrecondition,
        String::from("innings has completed"),
        correlation_id,
    );
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["code"], "failed_precondition");
    assert_eq!(value["message"], "innings has completed");
    assert_eq!(value["correlationId"], correlation_id.to_string());
}

/// The taxonomy maps onto the documented HTTP statuses.
#[test]
fn error_codes_map_to_http_statuses() {
    assert_eq!(ErrorCode::InvalidArgument.http_status(), 400);
    assert_eq!(ErrorCode::Unauthenticated.http_status(), 401);
    assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
    assert_eq!(ErrorCode::NotFound.http_status(), 404);
    assert_eq!(ErrorCode::Conflict.http_status(), 409);
    assert_eq!(ErrorCode::FailedPrecondition.http_status(), 422);
    assert_eq!(ErrorCode::Transient.http_status(), 503);
    assert_eq!(ErrorCode::Internal.http_status(), 500);
}
