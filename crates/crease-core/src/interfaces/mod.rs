// crates/crease-core/src/interfaces/mod.rs
// ============================================================================
// Module: Crease Interfaces
// Description: Backend-agnostic interfaces for event-log and state persistence.
// Purpose: Define the contract surfaces used by the Crease scoring engine.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the scoring engine integrates with storage without
//! embedding backend-specific details. Implementations must be deterministic
//! and fail closed on missing or corrupt data. The raw event log and the
//! match aggregate commit together: an event is never visible while its
//! projected effect is missing, or vice versa.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::event::ChainAudit;
use crate::core::event::RawEvent;
use crate::core::identifiers::MatchId;
use crate::core::match_state::MatchState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Persistence errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("score store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("score store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("score store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("score store invalid data: {0}")]
    Invalid(String),
    /// A uniqueness constraint was violated (duplicate sequence or event).
    #[error("score store conflict: {0}")]
    Conflict(String),
    /// Transient contention; the caller may retry.
    #[error("score store busy: {0}")]
    Busy(String),
    /// Store reported an error.
    #[error("score store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Append-only, hash-chained event log reader.
pub trait EventStore {
    /// Reads events for a match in `[from_seq, to_seq]`, ordered by sequence.
    ///
    /// A `to_seq` of `u64::MAX` reads to the tail.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn read_range(
        &self,
        match_id: MatchId,
        from_seq: u64,
        to_seq: u64,
    ) -> Result<Vec<RawEvent>, StoreError>;

    /// Re-hashes the full log for a match and reports the first broken link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn verify_chain(&self, match_id: MatchId) -> Result<ChainAudit, StoreError>;
}

// ============================================================================
// SECTION: Score Store
// ============================================================================

/// Combined persistence seam for the event log and the match aggregate.
///
/// `commit` is the only write path: it appends the raw events (when any) and
/// saves the aggregate snapshot in one transaction, so the log and the
/// projection can never diverge.
pub trait ScoreStore: EventStore {
    /// Loads the match aggregate by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load(&self, match_id: MatchId) -> Result<Option<MatchState>, StoreError>;

    /// Atomically appends raw events and saves the aggregate snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on duplicate sequence numbers and
    /// other [`StoreError`] variants when persistence fails. On error no
    /// event and no snapshot change is visible.
    fn commit(&self, events: &[RawEvent], state: &MatchState) -> Result<(), StoreError>;

    /// Lists identifiers of all stored matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError>;
}

impl<S: EventStore + ?Sized> EventStore for Box<S> {
    fn read_range(
        &self,
        match_id: MatchId,
        from_seq: u64,
        to_seq: u64,
    ) -> Result<Vec<RawEvent>, StoreError> {
        (**self).read_range(match_id, from_seq, to_seq)
    }

    fn verify_chain(&self, match_id: MatchId) -> Result<ChainAudit, StoreError> {
        (**self).verify_chain(match_id)
    }
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn load(&self, match_id: MatchId) -> Result<Option<MatchState>, StoreError> {
        (**self).load(match_id)
    }

    fn commit(&self, events: &[RawEvent], state: &MatchState) -> Result<(), StoreError> {
        (**self).commit(events, state)
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        (**self).list_matches()
    }
}

// ============================================================================
// SECTION: Archive Sink
// ============================================================================

/// Cold-storage archival seam.
///
/// Archival itself is an external collaborator; the engine only names the
/// interface and ships a no-op implementation.
pub trait ArchiveSink {
    /// Offers a completed match aggregate for archival.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the sink rejects the aggregate.
    fn archive(&self, state: &MatchState) -> Result<(), StoreError>;
}

/// Archive sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopArchiveSink;

impl ArchiveSink for NoopArchiveSink {
    fn archive(&self, _state: &MatchState) -> Result<(), StoreError> {
        Ok(())
    }
}
