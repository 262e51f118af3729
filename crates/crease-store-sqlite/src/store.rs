// crates/crease-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Score Store
// Description: Durable event log and match aggregate store backed by SQLite WAL.
// Purpose: Persist the hash chain and aggregate snapshots in one transaction.
// Dependencies: crease-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`ScoreStore`] using `SQLite`. Events
//! append into an immutable log table with a unique `(match_id,
//! sequence_number)` index; every commit writes the events and the canonical
//! JSON aggregate snapshot in one transaction, so the log and the projection
//! can never diverge. Loads verify integrity via stored hashes and fail
//! closed on corruption. Chain audits scan the log in sequence order and
//! re-derive every link.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use crease_core::ChainAudit;
use crease_core::EventPayload;
use crease_core::EventStore;
use crease_core::MatchId;
use crease_core::MatchState;
use crease_core::RawEvent;
use crease_core::ScoreStore;
use crease_core::ScorerSide;
use crease_core::StoreError;
use crease_core::Timestamp;
use crease_core::audit_chain;
use crease_core::hashing::DEFAULT_HASH_ALGORITHM;
use crease_core::hashing::canonical_json_bytes;
use crease_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum aggregate snapshot size accepted by the store.
pub const MAX_STATE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` score store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Configuration with defaults for the given database path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Uniqueness violation on the event log.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed score store with WAL support.
#[derive(Clone)]
pub struct SqliteScoreStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteScoreStore {
    /// Opens an `SQLite`-backed score store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs a closure over the locked connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io(String::from("store mutex poisoned")))?;
        op(&mut guard)
    }

    /// Reads raw events for a match inside `[from_seq, to_seq]`.
    fn read_events(
        &self,
        match_id: MatchId,
        from_seq: u64,
        to_seq: u64,
    ) -> Result<Vec<RawEvent>, SqliteStoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT event_id, sequence_number, scorer_id, scorer_side, kind,
                            payload_json, prior_hash, event_hash, signature,
                            event_timestamp, extensions_json
                     FROM scoring_events
                     WHERE match_id = ?1 AND sequence_number >= ?2 AND sequence_number <= ?3
                     ORDER BY sequence_number ASC",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let from = i64::try_from(from_seq).unwrap_or(i64::MAX);
            let to = i64::try_from(to_seq).unwrap_or(i64::MAX);
            let rows = statement
                .query_map(params![match_id.to_string(), from, to], |row| {
                    Ok(EventRow {
                        event_id: row.get(0)?,
                        sequence: row.get(1)?,
                        scorer_id: row.get(2)?,
                        scorer_side: row.get(3)?,
                        kind: row.get(4)?,
                        payload_json: row.get(5)?,
                        prior_hash: row.get(6)?,
                        event_hash: row.get(7)?,
                        signature: row.get(8)?,
                        event_timestamp: row.get(9)?,
                        extensions_json: row.get(10)?,
                    })
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut events = Vec::new();
            for row in rows {
                let row = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                events.push(build_event(match_id, row)?);
            }
            Ok(events)
        })
    }
}

impl EventStore for SqliteScoreStore {
    fn read_range(
        &self,
        match_id: MatchId,
        from_seq: u64,
        to_seq: u64,
    ) -> Result<Vec<RawEvent>, StoreError> {
        self.read_events(match_id, from_seq, to_seq).map_err(StoreError::from)
    }

    fn verify_chain(&self, match_id: MatchId) -> Result<ChainAudit, StoreError> {
        let events = self.read_events(match_id, 1, u64::MAX).map_err(StoreError::from)?;
        Ok(audit_chain(&events))
    }
}

impl ScoreStore for SqliteScoreStore {
    fn load(&self, match_id: MatchId) -> Result<Option<MatchState>, StoreError> {
        let row = self
            .with_connection(|connection| {
                connection
                    .query_row(
                        "SELECT state_json, state_hash FROM match_states WHERE match_id = ?1",
                        params![match_id.to_string()],
                        |row| {
                            let state_json: Vec<u8> = row.get(0)?;
                            let state_hash: String = row.get(1)?;
                            Ok((state_json, state_hash))
                        },
                    )
                    .optional()
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))
            })
            .map_err(StoreError::from)?;
        let Some((state_json, state_hash)) = row else {
            return Ok(None);
        };
        let expected = hash_bytes(DEFAULT_HASH_ALGORITHM, &state_json);
        if expected.value != state_hash {
            return Err(StoreError::Corrupt(String::from("match state hash mismatch")));
        }
        let state: MatchState = serde_json::from_slice(&state_json)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        Ok(Some(state))
    }

    fn commit(&self, events: &[RawEvent], state: &MatchState) -> Result<(), StoreError> {
        let state_json =
            canonical_json_bytes(state).map_err(|err| StoreError::Invalid(err.to_string()))?;
        if state_json.len() > MAX_STATE_BYTES {
            return Err(StoreError::Invalid(format!(
                "match state exceeds size limit: {} bytes (max {MAX_STATE_BYTES})",
                state_json.len()
            )));
        }
        let state_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &state_json);
        self.with_connection(|connection| {
            let tx = connection
                .transaction()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for event in events {
                insert_event(&tx, event)?;
            }
            tx.execute(
                "INSERT INTO match_states (match_id, state_json, state_hash)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(match_id) DO UPDATE SET
                    state_json = excluded.state_json,
                    state_hash = excluded.state_hash",
                params![state.record.match_id.to_string(), state_json, state_hash.value],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
        })
        .map_err(StoreError::from)
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare("SELECT match_id FROM match_states ORDER BY match_id ASC")
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![], |row| row.get::<_, String>(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut ids = Vec::new();
            for row in rows {
                let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                let id = raw
                    .parse::<MatchId>()
                    .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
                ids.push(id);
            }
            Ok(ids)
        })
        .map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// One event-log row as stored.
struct EventRow {
    /// Event identifier text.
    event_id: String,
    /// Sequence number.
    sequence: i64,
    /// Scorer identifier text.
    scorer_id: String,
    /// Scorer side JSON token.
    scorer_side: String,
    /// Payload kind name (denormalized for audits).
    kind: String,
    /// Payload JSON bytes.
    payload_json: Vec<u8>,
    /// Prior hash hex.
    prior_hash: String,
    /// Event hash hex.
    event_hash: String,
    /// Verbatim signature.
    signature: String,
    /// RFC 3339 event timestamp.
    event_timestamp: String,
    /// Extensions JSON, when any.
    extensions_json: Option<String>,
}

/// Rebuilds a [`RawEvent`] from its stored row, failing closed on bad data.
fn build_event(match_id: MatchId, row: EventRow) -> Result<RawEvent, SqliteStoreError> {
    let payload: EventPayload = serde_json::from_slice(&row.payload_json)
        .map_err(|err| SqliteStoreError::Corrupt(format!("payload decode failed: {err}")))?;
    if payload.kind_name() != row.kind {
        return Err(SqliteStoreError::Corrupt(String::from("payload kind column mismatch")));
    }
    let scorer_side: ScorerSide = serde_json::from_str(&format!("\"{}\"", row.scorer_side))
        .map_err(|err| SqliteStoreError::Corrupt(format!("scorer side decode failed: {err}")))?;
    let event_timestamp: Timestamp =
        serde_json::from_str(&format!("\"{}\"", row.event_timestamp)).map_err(|err| {
            SqliteStoreError::Corrupt(format!("event timestamp decode failed: {err}"))
        })?;
    let extensions = match row.extensions_json {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|err| SqliteStoreError::Corrupt(format!("extensions decode failed: {err}")))?,
        None => serde_json::Map::new(),
    };
    let sequence = u64::try_from(row.sequence)
        .map_err(|_| SqliteStoreError::Corrupt(String::from("negative sequence number")))?;
    Ok(RawEvent {
        event_id: row
            .event_id
            .parse()
            .map_err(|_| SqliteStoreError::Corrupt(String::from("bad event id")))?,
        match_id,
        sequence,
        scorer_id: row
            .scorer_id
            .parse()
            .map_err(|_| SqliteStoreError::Corrupt(String::from("bad scorer id")))?,
        scorer_side,
        payload,
        prior_hash: row.prior_hash,
        event_hash: row.event_hash,
        signature: row.signature,
        event_timestamp,
        extensions,
    })
}

/// Inserts one raw event, mapping uniqueness violations to conflicts.
fn insert_event(
    tx: &rusqlite::Transaction<'_>,
    event: &RawEvent,
) -> Result<(), SqliteStoreError> {
    let payload_json = serde_json::to_vec(&event.payload)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let extensions_json = if event.extensions.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&event.extensions)
                .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?,
        )
    };
    let side_json = serde_json::to_string(&event.scorer_side)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let side_token = side_json.trim_matches('"').to_string();
    let sequence = i64::try_from(event.sequence)
        .map_err(|_| SqliteStoreError::Invalid(String::from("sequence exceeds storage range")))?;
    let result = tx.execute(
        "INSERT INTO scoring_events (
            match_id, sequence_number, event_id, scorer_id, scorer_side, kind,
            payload_json, prior_hash, event_hash, signature, event_timestamp,
            extensions_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.match_id.to_string(),
            sequence,
            event.event_id.to_string(),
            event.scorer_id.to_string(),
            side_token,
            event.payload.kind_name(),
            payload_json,
            event.prior_hash,
            event.event_hash,
            event.signature,
            event.event_timestamp.to_rfc3339(),
            extensions_json,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(SqliteStoreError::Conflict(format!(
                "event sequence {} already exists",
                event.sequence
            )))
        }
        Err(err) => Err(SqliteStoreError::Db(err.to_string())),
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Creates the parent directory for the database file.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io(String::from("store path missing parent directory")));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens the connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Creates or validates the store schema.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS scoring_events (
                    match_id TEXT NOT NULL,
                    sequence_number INTEGER NOT NULL,
                    event_id TEXT NOT NULL,
                    scorer_id TEXT NOT NULL,
                    scorer_side TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    payload_json BLOB NOT NULL,
                    prior_hash TEXT NOT NULL,
                    event_hash TEXT NOT NULL,
                    signature TEXT NOT NULL,
                    event_timestamp TEXT NOT NULL,
                    extensions_json TEXT,
                    PRIMARY KEY (match_id, sequence_number)
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_scoring_events_event_id
                    ON scoring_events (event_id);
                CREATE TABLE IF NOT EXISTS match_states (
                    match_id TEXT PRIMARY KEY,
                    state_json BLOB NOT NULL,
                    state_hash TEXT NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "store schema version {found}, expected {SCHEMA_VERSION}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}
