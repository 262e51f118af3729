// crates/crease-server/src/ws.rs
// ============================================================================
// Module: Live Subscription Endpoint
// Description: WebSocket attach, heartbeat, and lifecycle for match rooms.
// Purpose: Stream validated deltas to spectators with liveness enforcement.
// Dependencies: axum, crease-protocol, futures-util, tokio
// ============================================================================

//! ## Overview
//! `GET /v1/matches/{id}/live?token=` upgrades to a WebSocket. A failed
//! token check closes with 1008 before anything streams. On attach the
//! subscriber receives a `ConnectionEstablished` snapshot, then deltas as
//! they commit. Clients ping with a text `ping` (answered `pong`); sixty
//! seconds of silence closes the socket with the timeout close code. When
//! the hub drops a subscriber past the high-water mark, the socket task
//! sends a policy close frame carrying the resume hint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::CloseFrame;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::response::Response;
use crease_core::MatchId;
use crease_protocol::MatchSnapshotView;
use crease_protocol::StreamMessage;
use futures_util::SinkExt;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::app::AppState;
use crate::audit::AuditEvent;
use crate::audit::AuditOutcome;
use crate::hub::OutboundFrame;

// ============================================================================
// SECTION: Close Codes
// ============================================================================

/// Close code for authentication failure.
const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// Close code for backpressure or room-policy closures.
const CLOSE_TRY_AGAIN_LATER: u16 = 1013;
/// Close code reserved for heartbeat timeout.
const CLOSE_HEARTBEAT_TIMEOUT: u16 = 4000;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Query parameters for the subscription endpoint.
#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    /// Bearer session token.
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /v1/matches/{id}/live` — upgrades to the live stream.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Query(params): Query<SubscribeParams>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(state, match_id, params, socket))
}

/// Runs one subscriber's socket lifecycle.
async fn handle_socket(
    state: AppState,
    match_id: MatchId,
    params: SubscribeParams,
    mut socket: WebSocket,
) {
    let correlation_id = state.correlation_id();

    // Authenticate before anything streams.
    let auth = params
        .token
        .as_deref()
        .ok_or_else(|| String::from("missing token"))
        .and_then(|token| {
            state.sessions.authenticate_token(token).map_err(|err| err.to_string())
        });
    let auth = match auth {
        Ok(auth) => auth,
        Err(reason) => {
            state.audit.record(&AuditEvent {
                event: "subscription",
                action: "attach",
                outcome: AuditOutcome::Deny,
                match_id: Some(match_id.to_string()),
                token_fingerprint: None,
                correlation_id: correlation_id.to_string(),
                code: Some(String::from("unauthenticated")),
                detail: Some(reason),
            });
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_POLICY_VIOLATION,
                    reason: "invalid or expired token".into(),
                })))
                .await;
            return;
        }
    };

    // The match must exist before a room is created for it.
    let snapshot = match state.service.engine().snapshot(match_id) {
        Ok(snapshot) => snapshot,
        Err(_) => {
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_TRY_AGAIN_LATER,
                    reason: "unknown match".into(),
                })))
                .await;
            return;
        }
    };

    let subscription = state.hub.attach(match_id);
    let subscriber_id = subscription.subscriber_id;
    let resume_hint = subscription.resume_hint;
    let mut receiver = subscription.receiver;

    state.audit.record(&AuditEvent {
        event: "subscription",
        action: "attach",
        outcome: AuditOutcome::Allow,
        match_id: Some(match_id.to_string()),
        token_fingerprint: Some(auth.token_fingerprint.clone()),
        correlation_id: correlation_id.to_string(),
        code: None,
        detail: None,
    });

    // Snapshot on attach.
    let established =
        StreamMessage::connection_established(&MatchSnapshotView::from_state(&snapshot), state.now());
    if !state.hub.send_to(match_id, subscriber_id, &established) {
        state.hub.detach(match_id, subscriber_id);
        return;
    }

    let idle_timeout = Duration::from_secs(state.config.hub.heartbeat_idle_secs);
    let send_deadline = Duration::from_millis(state.config.hub.send_deadline_ms);
    let (mut sink, mut stream) = socket.split();

    let mut idle_deadline = tokio::time::Instant::now() + idle_timeout;
    loop {
        tokio::select! {
            frame = receiver.recv() => {
                match frame {
                    Some(OutboundFrame::Message(text)) => {
                        let send = sink.send(Message::Text(text.into()));
                        match tokio::time::timeout(send_deadline, send).await {
                            Ok(Ok(())) => {}
                            // Send deadline exceeded or socket dead: prune.
                            Ok(Err(_)) | Err(_) => break,
                        }
                    }
                    None => {
                        // Dropped by the hub past the high-water mark.
                        let resume = resume_hint.load(Ordering::Relaxed);
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: CLOSE_TRY_AGAIN_LATER,
                                reason: format!("queue overflow; resume from {resume}").into(),
                            })))
                            .await;
                        state.hub.detach(match_id, subscriber_id);
                        return;
                    }
                }
            }
            inbound = stream.next() => {
                idle_deadline = tokio::time::Instant::now() + idle_timeout;
                match inbound {
                    None => break,
                    Some(Err(_)) => break,
                    Some(Ok(message)) => match message {
                        Message::Text(text) => {
                            if text.as_str() == "ping" {
                                let pong = sink.send(Message::Text("pong".into()));
                                if tokio::time::timeout(send_deadline, pong).await.is_err() {
                                    break;
                                }
                            } else if text.as_str() == "close" {
                                let _ = sink.send(Message::Close(None)).await;
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        Message::Ping(payload) => {
                            let _ = sink.send(Message::Pong(payload)).await;
                        }
                        Message::Pong(_) | Message::Binary(_) => {}
                    },
                }
            }
            () = tokio::time::sleep_until(idle_deadline) => {
                // No client traffic inside the heartbeat window.
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: CLOSE_HEARTBEAT_TIMEOUT,
                        reason: "heartbeat timeout".into(),
                    })))
                    .await;
                break;
            }
        }
    }

    state.hub.detach(match_id, subscriber_id);
    state.audit.record(&AuditEvent {
        event: "subscription",
        action: "detach",
        outcome: AuditOutcome::Allow,
        match_id: Some(match_id.to_string()),
        token_fingerprint: Some(auth.token_fingerprint),
        correlation_id: correlation_id.to_string(),
        code: None,
        detail: None,
    });
}
