// crates/crease-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Score Store
// Description: Mutex-guarded in-memory event log and aggregate store.
// Purpose: Provide the default store for tests and single-process deployments.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store keeps each match's raw event log and aggregate
//! snapshot under one mutex, so `commit` is atomic by construction. Chain
//! verification re-hashes the stored log exactly as the durable stores do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::event::ChainAudit;
use crate::core::event::RawEvent;
use crate::core::hashing::CHAIN_SENTINEL;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::chain_event_hash;
use crate::core::identifiers::MatchId;
use crate::core::match_state::MatchState;
use crate::interfaces::EventStore;
use crate::interfaces::ScoreStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Per-match storage cell.
#[derive(Debug, Clone, Default)]
struct MatchCell {
    /// Raw event log in sequence order.
    events: Vec<RawEvent>,
    /// Latest aggregate snapshot.
    state: Option<MatchState>,
}

/// In-memory [`ScoreStore`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    /// Match cells guarded by one mutex.
    inner: Mutex<HashMap<MatchId, MatchCell>>,
}

impl InMemoryScoreStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure over the locked cell map.
    fn with_cells<T>(
        &self,
        op: impl FnOnce(&mut HashMap<MatchId, MatchCell>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut cells = self
            .inner
            .lock()
            .map_err(|_| StoreError::Store(String::from("store mutex poisoned")))?;
        op(&mut cells)
    }

    /// Overwrites one stored event, for tamper-detection tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the sequence does not exist.
    pub fn tamper_event(
        &self,
        match_id: MatchId,
        sequence: u64,
        mutate: impl FnOnce(&mut RawEvent),
    ) -> Result<(), StoreError> {
        self.with_cells(|cells| {
            let cell = cells
                .get_mut(&match_id)
                .ok_or_else(|| StoreError::Invalid(format!("unknown match {match_id}")))?;
            let event = cell
                .events
                .iter_mut()
                .find(|event| event.sequence == sequence)
                .ok_or_else(|| StoreError::Invalid(format!("unknown sequence {sequence}")))?;
            mutate(event);
            Ok(())
        })
    }
}

impl EventStore for InMemoryScoreStore {
    fn read_range(
        &self,
        match_id: MatchId,
        from_seq: u64,
        to_seq: u64,
    ) -> Result<Vec<RawEvent>, StoreError> {
        self.with_cells(|cells| {
            let Some(cell) = cells.get(&match_id) else {
                return Ok(Vec::new());
            };
            Ok(cell
                .events
                .iter()
                .filter(|event| event.sequence >= from_seq && event.sequence <= to_seq)
                .cloned()
                .collect())
        })
    }

    fn verify_chain(&self, match_id: MatchId) -> Result<ChainAudit, StoreError> {
        let events = self.read_range(match_id, 1, u64::MAX)?;
        Ok(audit_chain(&events))
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn load(&self, match_id: MatchId) -> Result<Option<MatchState>, StoreError> {
        self.with_cells(|cells| Ok(cells.get(&match_id).and_then(|cell| cell.state.clone())))
    }

    fn commit(&self, events: &[RawEvent], state: &MatchState) -> Result<(), StoreError> {
        self.with_cells(|cells| {
            let cell = cells.entry(state.record.match_id).or_default();
            let mut next = cell.events.last().map_or(1, |event| event.sequence + 1);
            for event in events {
                if event.sequence != next {
                    return Err(StoreError::Conflict(format!(
                        "expected sequence {next}, got {}",
                        event.sequence
                    )));
                }
                next += 1;
            }
            cell.events.extend_from_slice(events);
            cell.state = Some(state.clone());
            Ok(())
        })
    }

    fn list_matches(&self) -> Result<Vec<MatchId>, StoreError> {
        self.with_cells(|cells| {
            let mut ids: Vec<MatchId> = cells.keys().copied().collect();
            ids.sort();
            Ok(ids)
        })
    }
}

// ============================================================================
// SECTION: Chain Audit
// ============================================================================

/// Re-hashes an ordered event log and reports the first broken link.
#[must_use]
pub fn audit_chain(events: &[RawEvent]) -> ChainAudit {
    let mut prior = String::from(CHAIN_SENTINEL);
    let mut expected_sequence = 1u64;
    for event in events {
        if event.sequence != expected_sequence || event.prior_hash != prior {
            return ChainAudit::broken_at(scanned_len(events), event.sequence);
        }
        let digest = chain_event_hash(
            DEFAULT_HASH_ALGORITHM,
            &event.prior_hash,
            event.scorer_id,
            event.event_timestamp,
            &event.payload,
        );
        match digest {
            Ok(digest) if digest.value == event.event_hash => {}
            _ => return ChainAudit::broken_at(scanned_len(events), event.sequence),
        }
        prior = event.event_hash.clone();
        expected_sequence += 1;
    }
    ChainAudit::intact(scanned_len(events))
}

/// Event count as a wire-width integer.
fn scanned_len(events: &[RawEvent]) -> u64 {
    u64::try_from(events.len()).unwrap_or(u64::MAX)
}
