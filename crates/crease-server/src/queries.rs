// crates/crease-server/src/queries.rs
// ============================================================================
// Module: Query API
// Description: Derived snapshots, ball ranges, disputes, and event replay.
// Purpose: Serve read paths over the aggregate and the raw event log.
// Dependencies: axum, crease-core, crease-protocol
// ============================================================================

//! ## Overview
//! Queries read the latest committed aggregate; they never mutate and never
//! take the match lock. Balls pending consensus surface informationally as
//! disputed rather than failing the request. Event replay serves the raw
//! log by sequence range so reconnecting subscribers can catch up.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use crease_core::BallNumber;
use crease_core::ChainAudit;
use crease_core::DisputeStatus;
use crease_core::EventStore;
use crease_core::MatchId;
use crease_protocol::BallStatus;
use crease_protocol::BallView;
use crease_protocol::DisputeView;
use crease_protocol::EventView;
use crease_protocol::InningsView;
use crease_protocol::MatchSnapshotView;
use serde::Deserialize;

use crate::app::AppState;
use crate::commands::open_scope;
use crate::error::ApiError;

// ============================================================================
// SECTION: Query Parameters
// ============================================================================

/// Range selector for ball queries, in decimal coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct BallRange {
    /// Lowest coordinate included.
    #[serde(default)]
    pub from: Option<BallNumber>,
    /// Highest coordinate included.
    #[serde(default)]
    pub to: Option<BallNumber>,
}

/// Innings selector.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InningsSelector {
    /// Serve only the innings in progress.
    #[serde(default)]
    pub current: bool,
}

/// Sequence range for event replay.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRange {
    /// First sequence included (1 when absent).
    #[serde(default)]
    pub from_seq: Option<u64>,
    /// Last sequence included (tail when absent).
    #[serde(default)]
    pub to_seq: Option<u64>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /v1/matches/{id}` — match snapshot with derived innings views.
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    headers: HeaderMap,
) -> Result<Json<MatchSnapshotView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let snapshot = state
        .service
        .engine()
        .snapshot(match_id)
        .map_err(|err| ApiError::from_engine(&err, scope.correlation_id))?;
    Ok(Json(MatchSnapshotView::from_state(&snapshot)))
}

/// `GET /v1/matches/{id}/innings?current=true` — innings views.
pub async fn get_innings(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Query(selector): Query<InningsSelector>,
    headers: HeaderMap,
) -> Result<Json<Vec<InningsView>>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let snapshot = state
        .service
        .engine()
        .snapshot(match_id)
        .map_err(|err| ApiError::from_engine(&err, scope.correlation_id))?;
    let balls_per_over = snapshot.record.rules.balls_per_over;
    let views: Vec<InningsView> = if selector.current {
        snapshot
            .projection
            .current_innings()
            .map(|innings| InningsView::from_projection(innings, balls_per_over))
            .into_iter()
            .collect()
    } else {
        snapshot
            .projection
            .innings_order
            .iter()
            .filter_map(|id| snapshot.projection.innings.get(id))
            .map(|innings| InningsView::from_projection(innings, balls_per_over))
            .collect()
    };
    Ok(Json(views))
}

/// `GET /v1/matches/{id}/balls?from=&to=` — committed and pending balls.
///
/// Committed balls serve canonically; coordinates with an open dispute are
/// included with the informational `disputed` status.
pub async fn get_balls(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Query(range): Query<BallRange>,
    headers: HeaderMap,
) -> Result<Json<Vec<BallView>>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let snapshot = state
        .service
        .engine()
        .snapshot(match_id)
        .map_err(|err| ApiError::from_engine(&err, scope.correlation_id))?;
    let in_range = |number: BallNumber| {
        range.from.is_none_or(|from| number >= from) && range.to.is_none_or(|to| number <= to)
    };
    let mut views = Vec::new();
    for innings_id in &snapshot.projection.innings_order {
        let Some(innings) = snapshot.projection.innings.get(innings_id) else {
            continue;
        };
        for ball in &innings.balls {
            if in_range(ball.number) {
                views.push(BallView::committed(ball));
            }
        }
    }
    for dispute in &snapshot.disputes {
        if dispute.status == DisputeStatus::Open && in_range(dispute.number) {
            if let Some(claim) = dispute.claims.first() {
                views.push(BallView {
                    ball_id: None,
                    innings_id: dispute.innings_id,
                    ball_number: dispute.number,
                    outcome: claim.outcome.clone(),
                    status: BallStatus::Disputed,
                    dispute_id: Some(dispute.dispute_id),
                    confidence: None,
                });
            }
        }
    }
    Ok(Json(views))
}

/// `GET /v1/matches/{id}/disputes` — all disputes for the match.
pub async fn get_disputes(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    headers: HeaderMap,
) -> Result<Json<Vec<DisputeView>>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let snapshot = state
        .service
        .engine()
        .snapshot(match_id)
        .map_err(|err| ApiError::from_engine(&err, scope.correlation_id))?;
    Ok(Json(snapshot.disputes.iter().map(DisputeView::from).collect()))
}

/// `GET /v1/matches/{id}/events?fromSeq=&toSeq=` — raw event replay.
pub async fn get_event_log(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Query(range): Query<SequenceRange>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let events = state
        .service
        .engine()
        .store()
        .read_range(match_id, range.from_seq.unwrap_or(1), range.to_seq.unwrap_or(u64::MAX))
        .map_err(|err| ApiError::from_store(&err, scope.correlation_id))?;
    Ok(Json(events.iter().map(EventView::from).collect()))
}

/// `GET /v1/matches/{id}/audit` — full hash-chain verification.
pub async fn get_chain_audit(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    headers: HeaderMap,
) -> Result<Json<ChainAudit>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let audit = state
        .service
        .engine()
        .store()
        .verify_chain(match_id)
        .map_err(|err| ApiError::from_store(&err, scope.correlation_id))?;
    Ok(Json(audit))
}
