// crates/crease-server/src/app.rs
// ============================================================================
// Module: Application Assembly
// Description: Shared state, router construction, and request plumbing.
// Purpose: Wire the service singletons into the versioned HTTP surface.
// Dependencies: axum, crease-core, tower-http
// ============================================================================

//! ## Overview
//! Process-wide services (store, match service, subscription hub, session
//! registry, audit sink) are created once at startup and injected into
//! handlers through [`AppState`]. They expose no mutable configuration after
//! start. The router mounts the versioned command, query, and subscription
//! endpoints with a CORS layer driven by the allowed-origins list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::routing::get;
use axum::routing::post;
use crease_core::CorrelationId;
use crease_core::Timestamp;
use time::OffsetDateTime;
use tower_http::cors::AllowOrigin;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::audit::AuditSink;
use crate::auth::SessionRegistry;
use crate::commands;
use crate::config::ServerConfig;
use crate::hub::MatchHub;
use crate::queries;
use crate::service::MatchService;
use crate::ws;

// ============================================================================
// SECTION: App State
// ============================================================================

/// Process-wide services injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Per-match command serialization over the engine.
    pub service: Arc<MatchService>,
    /// Subscription hub.
    pub hub: Arc<MatchHub>,
    /// Session registry.
    pub sessions: Arc<SessionRegistry>,
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Current UTC instant at millisecond precision.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        Timestamp::from_instant(OffsetDateTime::now_utc())
    }

    /// Fresh correlation id for one request.
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        CorrelationId::generate()
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the versioned router over the shared state.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/v1/matches", post(commands::create_match))
        .route("/v1/matches/{id}/toss", post(commands::conduct_toss))
        .route("/v1/matches/{id}/playing-xi", post(commands::set_playing_xi))
        .route("/v1/innings", post(commands::create_innings))
        .route("/v1/innings/{id}/batsmen", post(commands::set_batsmen))
        .route("/v1/innings/{id}/bowler", post(commands::set_bowler))
        .route("/v1/innings/{id}/close", post(commands::close_innings))
        .route("/v1/overs", post(commands::create_over))
        .route("/v1/balls", post(commands::submit_ball))
        .route("/v1/disputes/{id}/resolve", post(commands::resolve_dispute))
        .route("/v1/matches/{id}", get(queries::get_match))
        .route("/v1/matches/{id}/innings", get(queries::get_innings))
        .route("/v1/matches/{id}/balls", get(queries::get_balls))
        .route("/v1/matches/{id}/disputes", get(queries::get_disputes))
        .route("/v1/matches/{id}/events", get(queries::get_event_log))
        .route("/v1/matches/{id}/audit", get(queries::get_chain_audit))
        .route("/v1/matches/{id}/live", get(ws::subscribe))
        .layer(cors)
        .with_state(state)
}

/// Builds the CORS layer from the allowed-origins list.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
