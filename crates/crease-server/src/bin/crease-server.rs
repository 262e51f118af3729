// crates/crease-server/src/bin/crease-server.rs
// ============================================================================
// Module: Crease Server Entry Point
// Description: Binary bootstrapping configuration, storage, and the router.
// Purpose: Serve the scoring API with graceful shutdown and clean exit codes.
// Dependencies: clap, crease-server, crease-store-sqlite, tokio, tracing
// ============================================================================

//! ## Overview
//! The server binary loads configuration (optional TOML file plus
//! environment overrides), initializes logging at the configured level,
//! opens the store named by `DATABASE_URL`, and serves until interrupted.
//! Exit code 0 on clean shutdown; non-zero on fatal configuration or
//! storage errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crease_core::InMemoryScoreStore;
use crease_server::AppState;
use crease_server::AuditSink;
use crease_server::FileAuditSink;
use crease_server::MatchHub;
use crease_server::MatchService;
use crease_server::ServerConfig;
use crease_server::SessionRegistry;
use crease_server::SharedScoreStore;
use crease_server::StderrAuditSink;
use crease_server::build_router;
use crease_store_sqlite::SqliteScoreStore;
use crease_store_sqlite::SqliteStoreConfig;
use tracing::info;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Live cricket scoring server.
#[derive(Parser, Debug)]
#[command(name = "crease-server", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point returning an exit code.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[allow(clippy::print_stderr, reason = "fatal startup errors go to stderr")]
            {
                eprintln!("crease-server: {error}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, builds the application, and serves.
async fn run(cli: Cli) -> Result<(), String> {
    let config = match cli.config {
        Some(path) => ServerConfig::from_file(&path).map_err(|err| err.to_string())?,
        None => ServerConfig::default(),
    }
    .with_env_overrides();
    config.validate().map_err(|err| err.to_string())?;

    init_tracing(&config.log_level);

    let store = open_store(&config)?;
    let service = Arc::new(MatchService::new(
        store,
        Duration::from_millis(config.command_deadline_ms),
    ));
    let hub = Arc::new(MatchHub::new(config.hub.queue_capacity));
    let sessions = Arc::new(SessionRegistry::new(config.sessions.clone()));
    let audit: Arc<dyn AuditSink> = match &config.audit_log_path {
        Some(path) => Arc::new(
            FileAuditSink::new(std::path::Path::new(path))
                .map_err(|err| format!("audit log open failed: {err}"))?,
        ),
        None => Arc::new(StderrAuditSink),
    };

    let bind_addr = config.parse_bind_addr().map_err(|err| err.to_string())?;
    let state = AppState {
        service,
        hub,
        sessions,
        audit,
        config: Arc::new(config),
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|err| format!("bind {bind_addr} failed: {err}"))?;
    info!(address = %bind_addr, "serving");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| format!("server error: {err}"))?;
    info!("shutdown complete");
    Ok(())
}

/// Opens the store named by the database URL.
fn open_store(config: &ServerConfig) -> Result<SharedScoreStore, String> {
    if let Some(path) = config.sqlite_path() {
        let store = SqliteScoreStore::new(SqliteStoreConfig::at(path))
            .map_err(|err| format!("store open failed: {err}"))?;
        return Ok(Box::new(store));
    }
    Ok(Box::new(InMemoryScoreStore::new()))
}

/// Initializes the tracing subscriber at the configured level.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Resolves when an interrupt or terminate signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
