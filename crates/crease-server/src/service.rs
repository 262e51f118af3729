// crates/crease-server/src/service.rs
// ============================================================================
// Module: Match Service
// Description: Per-match command serialization over the scoring engine.
// Purpose: Enforce the single-writer-per-match model with command deadlines.
// Dependencies: crease-core, tokio
// ============================================================================

//! ## Overview
//! The service owns the scoring engine and one async mutex per match. A
//! command acquires the match lock under its deadline, runs the engine call,
//! and releases; lock timeouts surface as transient errors and leave no
//! partial state because events append only inside the critical section.
//! The service also resolves innings and dispute identifiers to their match,
//! since several endpoints address sub-entities directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crease_core::DisputeId;
use crease_core::EngineError;
use crease_core::InningsId;
use crease_core::MatchId;
use crease_core::ScoreStore;
use crease_core::ScoringEngine;

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Boxed store shared by the service and the query paths.
pub type SharedScoreStore = Box<dyn ScoreStore + Send + Sync>;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Command failures at the service layer.
#[derive(Debug)]
pub enum ServiceError {
    /// The match lock could not be acquired inside the deadline.
    LockTimeout,
    /// The engine rejected or failed the command.
    Engine(EngineError),
}

/// Per-match command serialization over the engine.
pub struct MatchService {
    /// The scoring engine over the shared store.
    engine: ScoringEngine<SharedScoreStore>,
    /// Per-match async locks.
    locks: Mutex<HashMap<MatchId, Arc<tokio::sync::Mutex<()>>>>,
    /// Innings-to-match index, populated lazily.
    innings_index: Mutex<HashMap<InningsId, MatchId>>,
    /// Command deadline bounding lock acquisition and storage I/O.
    deadline: Duration,
}

impl MatchService {
    /// Creates the service over a store with the given command deadline.
    #[must_use]
    pub fn new(store: SharedScoreStore, deadline: Duration) -> Self {
        Self {
            engine: ScoringEngine::new(store),
            locks: Mutex::new(HashMap::new()),
            innings_index: Mutex::new(HashMap::new()),
            deadline,
        }
    }

    /// Read access to the engine for query paths.
    pub const fn engine(&self) -> &ScoringEngine<SharedScoreStore> {
        &self.engine
    }

    /// Runs a command under the match lock, bounded by the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::LockTimeout`] when the lock cannot be taken
    /// inside the deadline and [`ServiceError::Engine`] on engine failures.
    pub async fn with_match_lock<T>(
        &self,
        match_id: MatchId,
        command: impl FnOnce(&ScoringEngine<SharedScoreStore>) -> Result<T, EngineError>,
    ) -> Result<T, ServiceError> {
        let lock = self.lock_for(match_id);
        let Ok(guard) = tokio::time::timeout(self.deadline, lock.lock()).await else {
            return Err(ServiceError::LockTimeout);
        };
        let result = command(&self.engine).map_err(ServiceError::Engine);
        drop(guard);
        result
    }

    /// Returns (creating on first use) the lock for a match.
    fn lock_for(&self, match_id: MatchId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(match_id).or_default())
    }

    /// Records an innings-to-match mapping after an innings opens.
    pub fn index_innings(&self, innings_id: InningsId, match_id: MatchId) {
        if let Ok(mut index) = self.innings_index.lock() {
            index.insert(innings_id, match_id);
        }
    }

    /// Resolves the match owning an innings.
    ///
    /// Falls back to scanning stored matches when the index misses (after a
    /// restart), caching the result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no match owns the innings.
    pub fn resolve_innings(&self, innings_id: InningsId) -> Result<MatchId, EngineError> {
        if let Ok(index) = self.innings_index.lock() {
            if let Some(match_id) = index.get(&innings_id) {
                return Ok(*match_id);
            }
        }
        for match_id in self.engine.store().list_matches()? {
            let Some(state) = self.engine.store().load(match_id)? else {
                continue;
            };
            if state.projection.innings.contains_key(&innings_id) {
                self.index_innings(innings_id, match_id);
                return Ok(match_id);
            }
        }
        Err(EngineError::NotFound(format!("innings {innings_id}")))
    }

    /// Resolves the match owning a dispute.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no match owns the dispute.
    pub fn resolve_dispute_match(&self, dispute_id: DisputeId) -> Result<MatchId, EngineError> {
        for match_id in self.engine.store().list_matches()? {
            let Some(state) = self.engine.store().load(match_id)? else {
                continue;
            };
            if state.disputes.iter().any(|dispute| dispute.dispute_id == dispute_id) {
                return Ok(match_id);
            }
        }
        Err(EngineError::NotFound(format!("dispute {dispute_id}")))
    }
}
