// crates/crease-server/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: Serde-backed configuration with environment overrides.
// Purpose: Validate everything the server needs before it starts serving.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration loads from an optional TOML file and is then overridden by
//! environment variables (`DATABASE_URL`, `CREASE_SIGNING_SECRET`,
//! `CREASE_ALLOWED_ORIGINS`, `CREASE_BIND_ADDR`, `CREASE_LOG_LEVEL`).
//! Validation is fail-fast: a server with an unusable database URL or an
//! empty signing secret refuses to start.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;

use crease_core::UserId;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// Default command deadline in milliseconds.
const DEFAULT_COMMAND_DEADLINE_MS: u64 = 5_000;
/// Default per-subscriber queue capacity (the backpressure high-water mark).
const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Default idle timeout before a silent subscriber is closed, in seconds.
const DEFAULT_HEARTBEAT_IDLE_SECS: u64 = 60;
/// Default per-message send deadline, in milliseconds.
const DEFAULT_SEND_DEADLINE_MS: u64 = 5_000;

/// Returns the default bind address.
fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

/// Returns the default command deadline.
const fn default_command_deadline_ms() -> u64 {
    DEFAULT_COMMAND_DEADLINE_MS
}

/// Returns the default log level.
fn default_log_level() -> String {
    String::from("info")
}

/// Returns the default queue capacity.
const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Returns the default heartbeat idle timeout.
const fn default_heartbeat_idle_secs() -> u64 {
    DEFAULT_HEARTBEAT_IDLE_SECS
}

/// Returns the default send deadline.
const fn default_send_deadline_ms() -> u64 {
    DEFAULT_SEND_DEADLINE_MS
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Subscription hub tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Per-subscriber queue capacity; exceeding it drops the subscriber.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seconds of silence before the server closes a subscriber.
    #[serde(default = "default_heartbeat_idle_secs")]
    pub heartbeat_idle_secs: u64,
    /// Per-message send deadline in milliseconds.
    #[serde(default = "default_send_deadline_ms")]
    pub send_deadline_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            heartbeat_idle_secs: DEFAULT_HEARTBEAT_IDLE_SECS,
            send_deadline_ms: DEFAULT_SEND_DEADLINE_MS,
        }
    }
}

/// One seeded session mapping a bearer token to a verified identity.
///
/// Token issuance is an external collaborator; the server consumes verified
/// identities seeded here or registered at runtime by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSeed {
    /// Bearer token value.
    pub token: String,
    /// Verified caller identity the token maps to.
    pub user_id: UserId,
}

/// Full server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Database URL; `sqlite:<path>` or `memory:` for the in-process store.
    #[serde(default)]
    pub database_url: String,
    /// Secret used to derive per-session MAC keys for event signatures.
    #[serde(default)]
    pub signing_secret: String,
    /// Allowed CORS origins; `*` allows any.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Per-command deadline in milliseconds.
    #[serde(default = "default_command_deadline_ms")]
    pub command_deadline_ms: u64,
    /// Subscription hub tuning.
    #[serde(default)]
    pub hub: HubConfig,
    /// Seeded sessions.
    #[serde(default)]
    pub sessions: Vec<SessionSeed>,
    /// Optional audit log path; stderr when absent.
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: String::new(),
            signing_secret: String::new(),
            allowed_origins: Vec::new(),
            log_level: default_log_level(),
            command_deadline_ms: DEFAULT_COMMAND_DEADLINE_MS,
            hub: HubConfig::default(),
            sessions: Vec::new(),
            audit_log_path: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides on top of the loaded values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = std::env::var("CREASE_SIGNING_SECRET") {
            self.signing_secret = value;
        }
        if let Ok(value) = std::env::var("CREASE_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = std::env::var("CREASE_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Ok(value) = std::env::var("CREASE_ALLOWED_ORIGINS") {
            self.allowed_origins =
                value.split(',').map(|origin| origin.trim().to_string()).collect();
        }
        self
    }

    /// Validates the configuration before serving.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first unusable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_bind_addr()?;
        if self.database_url.is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "database_url is required (sqlite:<path> or memory:)",
            )));
        }
        if !self.database_url.starts_with("sqlite:") && self.database_url != "memory:" {
            return Err(ConfigError::Invalid(format!(
                "unsupported database_url scheme: {}",
                self.database_url
            )));
        }
        if self.signing_secret.is_empty() {
            return Err(ConfigError::Invalid(String::from("signing_secret is required")));
        }
        if self.hub.queue_capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "hub.queue_capacity must be at least 1",
            )));
        }
        Ok(())
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn parse_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad bind_addr: {}", self.bind_addr)))
    }

    /// Returns the SQLite path, when the URL names one.
    #[must_use]
    pub fn sqlite_path(&self) -> Option<&str> {
        self.database_url.strip_prefix("sqlite:")
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File read failure.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Unusable value.
    #[error("config invalid: {0}")]
    Invalid(String),
}
