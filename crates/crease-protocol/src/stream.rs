// crates/crease-protocol/src/stream.rs
// ============================================================================
// Module: Stream Messages
// Description: WebSocket frame envelope and payloads for room fan-out.
// Purpose: Define the stable wire names spectators consume in real time.
// Dependencies: crease-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every server-to-client frame is `{type, timestamp, data}`. The type names
//! are stable wire identifiers; payloads are built from engine deltas and
//! carry the derived innings context clients need to render without extra
//! queries. Held commits stream as provisional deltas flagged `unconfirmed`
//! until a reconciliation confirms them in order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crease_core::EngineEvent;
use crease_core::InningsState;
use crease_core::Milestone;
use crease_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::views::BallView;
use crate::views::DisputeView;
use crate::views::MatchSnapshotView;

// ============================================================================
// SECTION: Message Kinds
// ============================================================================

/// Stable wire names of stream message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamMessageKind {
    /// Snapshot delivered on attach.
    ConnectionEstablished,
    /// A canonical ball was committed.
    BallBowled,
    /// A wicket fell.
    WicketFallen,
    /// An over completed.
    OverComplete,
    /// An innings completed.
    InningsComplete,
    /// The match completed.
    MatchComplete,
    /// Batsmen or bowler assignment changed.
    PlayerChanged,
    /// A milestone was achieved.
    MilestoneAchieved,
    /// A scoring dispute was opened.
    ScoringDisputeRaised,
    /// A scoring dispute was resolved.
    DisputeResolved,
    /// Canonical balls committed in order after a resolution.
    Reconciliation,
    /// An error frame for the affected subscriber.
    Error,
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// One server-to-client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: StreamMessageKind,
    /// Server timestamp for the frame.
    pub timestamp: Timestamp,
    /// Kind-specific payload.
    pub data: Value,
}

impl StreamMessage {
    /// Builds a frame from a kind and payload.
    #[must_use]
    pub const fn new(kind: StreamMessageKind, timestamp: Timestamp, data: Value) -> Self {
        Self {
            kind,
            timestamp,
            data,
        }
    }

    /// Builds the attach snapshot frame.
    #[must_use]
    pub fn connection_established(snapshot: &MatchSnapshotView, at: Timestamp) -> Self {
        Self::new(
            StreamMessageKind::ConnectionEstablished,
            at,
            serde_json::to_value(snapshot).unwrap_or(Value::Null),
        )
    }

    /// Builds an error frame scoped to one subscriber.
    #[must_use]
    pub fn error(message: &str, at: Timestamp) -> Self {
        Self::new(
            StreamMessageKind::Error,
            at,
            json!({
                "message": message,
            }),
        )
    }

    /// Maps one engine delta to its stream frames.
    ///
    /// Most deltas map to exactly one frame; deltas with no spectator-facing
    /// counterpart map to none.
    #[must_use]
    pub fn from_engine_event(event: &EngineEvent, at: Timestamp) -> Vec<Self> {
        match event {
            EngineEvent::BallCommitted {
                ball,
                innings,
            } => vec![Self::new(
                StreamMessageKind::BallBowled,
                at,
                json!({
                    "ball": BallView::committed(ball),
                    "inningsState": innings_context(innings),
                    "unconfirmed": false,
                }),
            )],
            EngineEvent::BallHeld {
                innings_id,
                number,
                outcome,
            } => vec![Self::new(
                StreamMessageKind::BallBowled,
                at,
                json!({
                    "ball": {
                        "inningsId": innings_id,
                        "ballNumber": number,
                        "outcome": outcome,
                        "status": "held",
                    },
                    "unconfirmed": true,
                }),
            )],
            EngineEvent::WicketFallen {
                ball,
                fall,
                innings,
            } => vec![Self::new(
                StreamMessageKind::WicketFallen,
                at,
                json!({
                    "ball": BallView::committed(ball),
                    "fallOfWicket": fall,
                    "fallOfWicketLine": format!(
                        "{}/{} ({} overs)",
                        fall.score,
                        fall.wicket_number,
                        overs_line(innings),
                    ),
                    "inningsState": innings_context(innings),
                }),
            )],
            EngineEvent::OverCompleted {
                over,
                innings,
            } => vec![Self::new(
                StreamMessageKind::OverComplete,
                at,
                json!({
                    "over": crate::views::OverView::from(over),
                    "inningsState": innings_context(innings),
                }),
            )],
            EngineEvent::InningsCompleted {
                innings,
                reason,
            } => vec![Self::new(
                StreamMessageKind::InningsComplete,
                at,
                json!({
                    "inningsState": innings_context(innings),
                    "reason": reason,
                }),
            )],
            EngineEvent::MatchCompleted {
                record,
            } => vec![Self::new(
                StreamMessageKind::MatchComplete,
                at,
                json!({
                    "matchId": record.match_id,
                    "result": record.result,
                }),
            )],
            EngineEvent::PlayerChanged {
                innings_id,
                striker,
                non_striker,
                bowler,
            } => vec![Self::new(
                StreamMessageKind::PlayerChanged,
                at,
                json!({
                    "inningsId": innings_id,
                    "striker": striker,
                    "nonStriker": non_striker,
                    "bowler": bowler,
                }),
            )],
            EngineEvent::MilestoneAchieved {
                innings_id,
                milestone,
            } => vec![Self::new(
                StreamMessageKind::MilestoneAchieved,
                at,
                json!({
                    "inningsId": innings_id,
                    "milestone": milestone_payload(milestone),
                }),
            )],
            EngineEvent::DisputeRaised {
                dispute,
            } => vec![Self::new(
                StreamMessageKind::ScoringDisputeRaised,
                at,
                json!({
                    "dispute": DisputeView::from(dispute),
                }),
            )],
            EngineEvent::DisputeResolved {
                dispute_id,
                number,
                method,
            } => vec![Self::new(
                StreamMessageKind::DisputeResolved,
                at,
                json!({
                    "disputeId": dispute_id,
                    "ballNumber": number,
                    "method": method,
                }),
            )],
            EngineEvent::Reconciliation {
                innings_id,
                balls,
            } => vec![Self::new(
                StreamMessageKind::Reconciliation,
                at,
                json!({
                    "inningsId": innings_id,
                    "balls": balls.iter().map(BallView::committed).collect::<Vec<_>>(),
                }),
            )],
        }
    }
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Innings context block embedded in scoring frames.
fn innings_context(innings: &InningsState) -> Value {
    json!({
        "inningsId": innings.innings_id,
        "score": format!("{}/{}", innings.total_runs, innings.wickets_fallen),
        "overs": overs_line(innings),
        "totalRuns": innings.total_runs,
        "wickets": innings.wickets_fallen,
        "extras": innings.extras_total,
        "target": innings.target,
        "isCompleted": innings.completed,
    })
}

/// Overs string from the innings cursor, e.g. `12.4`.
fn overs_line(innings: &InningsState) -> String {
    format!("{}.{}", innings.current_over.saturating_sub(1), innings.ball_in_over)
}

/// Milestone payload with its wire discriminator.
fn milestone_payload(milestone: &Milestone) -> Value {
    serde_json::to_value(milestone).unwrap_or(Value::Null)
}
