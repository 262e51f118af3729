// crates/crease-server/src/commands.rs
// ============================================================================
// Module: Command API
// Description: Versioned command endpoints for scorers and officials.
// Purpose: Authenticate, validate, dispatch to the engine, and fan out deltas.
// Dependencies: axum, crease-core, crease-protocol
// ============================================================================

//! ## Overview
//! Every command follows one shape: authenticate the bearer session, build
//! the command context with a fresh correlation id, run the engine call
//! under the match lock and deadline, audit the outcome, broadcast the
//! emitted deltas to the match room, and serve the view. Broadcasting only
//! enqueues; slow subscribers never slow a scorer down.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use crease_core::BallSubmission;
use crease_core::CommandContext;
use crease_core::CorrelationId;
use crease_core::CreateMatch;
use crease_core::DisputeId;
use crease_core::EngineEvent;
use crease_core::InningsId;
use crease_core::MatchId;
use crease_core::MatchOfficial;
use crease_core::MatchRules;
use crease_core::OfficialRole;
use crease_core::ScorerSide;
use crease_core::hashing::sign_payload;
use crease_protocol::BallStatus;
use crease_protocol::BallSubmit;
use crease_protocol::BallView;
use crease_protocol::DisputeResolveRequest;
use crease_protocol::DisputeView;
use crease_protocol::InningsCloseRequest;
use crease_protocol::InningsCreate;
use crease_protocol::InningsView;
use crease_protocol::MatchCreate;
use crease_protocol::MatchView;
use crease_protocol::OfficialRoleBody;
use crease_protocol::OverCreate;
use crease_protocol::OverView;
use crease_protocol::PlayingXiEntryBody;
use crease_protocol::PlayingXiRequest;
use crease_protocol::SetBatsmenRequest;
use crease_protocol::SetBowlerRequest;
use crease_protocol::StreamMessage;
use crease_protocol::TossRequest;
use serde_json::Map;

use crate::app::AppState;
use crate::audit::AuditEvent;
use crate::audit::AuditOutcome;
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::service::ServiceError;

// ============================================================================
// SECTION: Request Plumbing
// ============================================================================

/// Authenticated request context threaded through every command.
pub struct RequestScope {
    /// Authenticated caller.
    pub auth: AuthContext,
    /// Correlation id for the request.
    pub correlation_id: CorrelationId,
}

/// Authenticates the bearer session and assigns a correlation id.
///
/// # Errors
///
/// Returns an `unauthenticated` [`ApiError`] on failure.
pub fn open_scope(state: &AppState, headers: &HeaderMap) -> Result<RequestScope, ApiError> {
    let correlation_id = state.correlation_id();
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    match state.sessions.authenticate_header(header) {
        Ok(auth) => Ok(RequestScope {
            auth,
            correlation_id,
        }),
        Err(error) => {
            state.audit.record(&AuditEvent {
                event: "command",
                action: "authenticate",
                outcome: AuditOutcome::Deny,
                match_id: None,
                token_fingerprint: None,
                correlation_id: correlation_id.to_string(),
                code: Some(String::from("unauthenticated")),
                detail: Some(error.to_string()),
            });
            Err(ApiError::from_auth(&error, correlation_id))
        }
    }
}

/// Converts a service failure into the wire error, recording the audit line.
fn fail(
    state: &AppState,
    scope: &RequestScope,
    action: &'static str,
    match_id: Option<MatchId>,
    error: &ServiceError,
) -> ApiError {
    let api_error = match error {
        ServiceError::LockTimeout => ApiError::lock_timeout(scope.correlation_id),
        ServiceError::Engine(engine) => ApiError::from_engine(engine, scope.correlation_id),
    };
    state.audit.record(&AuditEvent {
        event: "command",
        action,
        outcome: AuditOutcome::Error,
        match_id: match_id.map(|id| id.to_string()),
        token_fingerprint: Some(scope.auth.token_fingerprint.clone()),
        correlation_id: scope.correlation_id.to_string(),
        code: None,
        detail: Some(api_error.body.message.clone()),
    });
    api_error
}

/// Records a successful command audit line.
fn audit_ok(state: &AppState, scope: &RequestScope, action: &'static str, match_id: MatchId) {
    state.audit.record(&AuditEvent {
        event: "command",
        action,
        outcome: AuditOutcome::Allow,
        match_id: Some(match_id.to_string()),
        token_fingerprint: Some(scope.auth.token_fingerprint.clone()),
        correlation_id: scope.correlation_id.to_string(),
        code: None,
        detail: None,
    });
}

/// Broadcasts engine deltas to the match room.
fn broadcast(state: &AppState, match_id: MatchId, events: &[EngineEvent], sequence: u64) {
    if events.is_empty() {
        return;
    }
    let at = state.now();
    let frames: Vec<StreamMessage> =
        events.iter().flat_map(|event| StreamMessage::from_engine_event(event, at)).collect();
    state.hub.broadcast(match_id, &frames, sequence);
}

/// Builds the engine command context for a request.
fn command_context(state: &AppState, scope: &RequestScope) -> CommandContext {
    CommandContext {
        caller: scope.auth.user_id,
        now: state.now(),
        correlation_id: Some(scope.correlation_id),
    }
}

/// Maps wire official entries to core officials.
fn map_officials(entries: &[crease_protocol::OfficialEntry]) -> Vec<MatchOfficial> {
    entries
        .iter()
        .filter_map(|entry| {
            let role = match entry.role {
                OfficialRoleBody::ScorerHome => OfficialRole::Scorer {
                    side: ScorerSide::Home,
                },
                OfficialRoleBody::ScorerAway => OfficialRole::Scorer {
                    side: ScorerSide::Away,
                },
                OfficialRoleBody::Umpire => OfficialRole::Scorer {
                    side: ScorerSide::Umpire,
                },
                OfficialRoleBody::Official => OfficialRole::Official,
                OfficialRoleBody::Captain => OfficialRole::Captain {
                    team: entry.team_id?,
                },
            };
            Some(MatchOfficial {
                user_id: entry.user_id,
                role,
            })
        })
        .collect()
}

// ============================================================================
// SECTION: Match Setup Commands
// ============================================================================

/// `POST /v1/matches` — creates a match.
pub async fn create_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MatchCreate>,
) -> Result<Json<MatchView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let input = CreateMatch {
        team_a: body.team_a,
        team_b: body.team_b,
        rules: body.rules.unwrap_or_else(MatchRules::t20),
        officials: map_officials(&body.officials),
    };
    let created = state
        .service
        .engine()
        .create_match(&ctx, input)
        .map_err(|err| fail(&state, &scope, "create_match", None, &ServiceError::Engine(err)))?;
    audit_ok(&state, &scope, "create_match", created.record.match_id);
    Ok(Json(MatchView::from(&created.record)))
}

/// `POST /v1/matches/{id}/toss` — records the toss. Creator only.
pub async fn conduct_toss(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    headers: HeaderMap,
    Json(body): Json<TossRequest>,
) -> Result<Json<MatchView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let updated = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.conduct_toss(&ctx, match_id, body.toss_won_by, body.elected_to)
        })
        .await
        .map_err(|err| fail(&state, &scope, "conduct_toss", Some(match_id), &err))?;
    audit_ok(&state, &scope, "conduct_toss", match_id);
    Ok(Json(MatchView::from(&updated.record)))
}

/// `POST /v1/matches/{id}/playing-xi` — sets a side. Captain or creator.
pub async fn set_playing_xi(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    headers: HeaderMap,
    Json(body): Json<PlayingXiRequest>,
) -> Result<Json<Vec<PlayingXiEntryBody>>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let entries: Vec<crease_core::PlayingXiEntry> =
        body.entries.iter().copied().map(Into::into).collect();
    state
        .service
        .with_match_lock(match_id, |engine| {
            engine.set_playing_xi(&ctx, match_id, body.team_id, entries)
        })
        .await
        .map_err(|err| fail(&state, &scope, "set_playing_xi", Some(match_id), &err))?;
    audit_ok(&state, &scope, "set_playing_xi", match_id);
    Ok(Json(body.entries))
}

// ============================================================================
// SECTION: Innings and Over Commands
// ============================================================================

/// `POST /v1/innings` — opens the next innings. Scorers only.
pub async fn create_innings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InningsCreate>,
) -> Result<Json<InningsView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = body.match_id;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.open_innings(&ctx, match_id, body.batting_team_id)
        })
        .await
        .map_err(|err| fail(&state, &scope, "create_innings", Some(match_id), &err))?;
    state.service.index_innings(committed.value.innings_id, match_id);
    audit_ok(&state, &scope, "create_innings", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    innings_view(&state, match_id, committed.value.innings_id, scope.correlation_id)
}

/// `POST /v1/innings/{id}/batsmen` — assigns the batsmen. Scorers only.
pub async fn set_batsmen(
    State(state): State<AppState>,
    Path(innings_id): Path<InningsId>,
    headers: HeaderMap,
    Json(body): Json<SetBatsmenRequest>,
) -> Result<Json<InningsView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_innings(innings_id)
        .map_err(|err| fail(&state, &scope, "set_batsmen", None, &ServiceError::Engine(err)))?;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.set_batsmen(&ctx, match_id, innings_id, body.striker_id, body.non_striker_id)
        })
        .await
        .map_err(|err| fail(&state, &scope, "set_batsmen", Some(match_id), &err))?;
    audit_ok(&state, &scope, "set_batsmen", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    innings_view(&state, match_id, innings_id, scope.correlation_id)
}

/// `POST /v1/innings/{id}/bowler` — assigns the bowler. Scorers only.
pub async fn set_bowler(
    State(state): State<AppState>,
    Path(innings_id): Path<InningsId>,
    headers: HeaderMap,
    Json(body): Json<SetBowlerRequest>,
) -> Result<Json<InningsView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_innings(innings_id)
        .map_err(|err| fail(&state, &scope, "set_bowler", None, &ServiceError::Engine(err)))?;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.set_bowler(&ctx, match_id, innings_id, body.bowler_id)
        })
        .await
        .map_err(|err| fail(&state, &scope, "set_bowler", Some(match_id), &err))?;
    audit_ok(&state, &scope, "set_bowler", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    innings_view(&state, match_id, innings_id, scope.correlation_id)
}

/// `POST /v1/innings/{id}/close` — closes an innings. Scorers only.
pub async fn close_innings(
    State(state): State<AppState>,
    Path(innings_id): Path<InningsId>,
    headers: HeaderMap,
    Json(body): Json<InningsCloseRequest>,
) -> Result<Json<InningsView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_innings(innings_id)
        .map_err(|err| fail(&state, &scope, "close_innings", None, &ServiceError::Engine(err)))?;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.close_innings(&ctx, match_id, innings_id, body.declared)
        })
        .await
        .map_err(|err| fail(&state, &scope, "close_innings", Some(match_id), &err))?;
    audit_ok(&state, &scope, "close_innings", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    innings_view(&state, match_id, innings_id, scope.correlation_id)
}

/// `POST /v1/overs` — opens a new over. Scorers only.
pub async fn create_over(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OverCreate>,
) -> Result<Json<OverView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_innings(body.innings_id)
        .map_err(|err| fail(&state, &scope, "create_over", None, &ServiceError::Engine(err)))?;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.open_over(&ctx, match_id, body.innings_id, body.over_number, body.bowler_id)
        })
        .await
        .map_err(|err| fail(&state, &scope, "create_over", Some(match_id), &err))?;
    audit_ok(&state, &scope, "create_over", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    Ok(Json(OverView::from(&committed.value)))
}

// ============================================================================
// SECTION: Ball Submission
// ============================================================================

/// `POST /v1/balls` — submits one delivery. The primary scoring endpoint.
pub async fn submit_ball(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BallSubmit>,
) -> Result<Json<BallView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_innings(body.innings_id)
        .map_err(|err| fail(&state, &scope, "submit_ball", None, &ServiceError::Engine(err)))?;
    let submission = BallSubmission::from(body);
    let signature = sign_payload(&scope.auth.credential, &submission).map_err(|_| {
        fail(
            &state,
            &scope,
            "submit_ball",
            Some(match_id),
            &ServiceError::Engine(crease_core::EngineError::InvalidArgument(String::from(
                "submission cannot be canonicalized",
            ))),
        )
    })?;
    let view_submission = submission.clone();
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.submit_ball(&ctx, match_id, submission, signature, Map::new())
        })
        .await
        .map_err(|err| fail(&state, &scope, "submit_ball", Some(match_id), &err))?;
    audit_ok(&state, &scope, "submit_ball", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);

    let view = match committed.value {
        crease_core::BallDisposition::Pending => BallView {
            ball_id: None,
            innings_id: view_submission.innings_id,
            ball_number: view_submission.number,
            outcome: view_submission.outcome,
            status: BallStatus::Pending,
            dispute_id: None,
            confidence: None,
        },
        crease_core::BallDisposition::Committed {
            ball_id,
        } => BallView {
            ball_id: Some(ball_id),
            innings_id: view_submission.innings_id,
            ball_number: view_submission.number,
            outcome: view_submission.outcome,
            status: BallStatus::Committed,
            dispute_id: None,
            confidence: Some(1.0),
        },
        crease_core::BallDisposition::Held {
            number,
        } => BallView {
            ball_id: None,
            innings_id: view_submission.innings_id,
            ball_number: number,
            outcome: view_submission.outcome,
            status: BallStatus::Held,
            dispute_id: None,
            confidence: None,
        },
        crease_core::BallDisposition::Disputed {
            dispute_id,
        } => BallView {
            ball_id: None,
            innings_id: view_submission.innings_id,
            ball_number: view_submission.number,
            outcome: view_submission.outcome,
            status: BallStatus::Disputed,
            dispute_id: Some(dispute_id),
            confidence: None,
        },
    };
    Ok(Json(view))
}

// ============================================================================
// SECTION: Dispute Resolution
// ============================================================================

/// `POST /v1/disputes/{id}/resolve` — settles a dispute. Officials only.
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Path(dispute_id): Path<DisputeId>,
    headers: HeaderMap,
    Json(body): Json<DisputeResolveRequest>,
) -> Result<Json<DisputeView>, ApiError> {
    let scope = open_scope(&state, &headers)?;
    let ctx = command_context(&state, &scope);
    let match_id = state
        .service
        .resolve_dispute_match(dispute_id)
        .map_err(|err| fail(&state, &scope, "resolve_dispute", None, &ServiceError::Engine(err)))?;
    let committed = state
        .service
        .with_match_lock(match_id, |engine| {
            engine.resolve_dispute(&ctx, match_id, dispute_id, body.final_payload.clone())
        })
        .await
        .map_err(|err| fail(&state, &scope, "resolve_dispute", Some(match_id), &err))?;
    audit_ok(&state, &scope, "resolve_dispute", match_id);
    broadcast(&state, match_id, &committed.events, committed.sequence);
    Ok(Json(DisputeView::from(&committed.value)))
}

// ============================================================================
// SECTION: View Helpers
// ============================================================================

/// Loads the current innings view after a committed command.
fn innings_view(
    state: &AppState,
    match_id: MatchId,
    innings_id: InningsId,
    correlation_id: CorrelationId,
) -> Result<Json<InningsView>, ApiError> {
    let snapshot = state
        .service
        .engine()
        .snapshot(match_id)
        .map_err(|err| ApiError::from_engine(&err, correlation_id))?;
    let projection = snapshot.projection.innings_by_id(innings_id).ok_or_else(|| {
        ApiError::from_engine(
            &crease_core::EngineError::NotFound(format!("innings {innings_id}")),
            correlation_id,
        )
    })?;
    Ok(Json(InningsView::from_projection(projection, snapshot.record.rules.balls_per_over)))
}
