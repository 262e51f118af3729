// crates/crease-store-sqlite/src/lib.rs
// ============================================================================
// Module: Crease SQLite Store Library
// Description: Durable ScoreStore implementation over SQLite.
// Purpose: Expose the SQLite-backed event log and aggregate store.
// Dependencies: crease-core, rusqlite
// ============================================================================

//! ## Overview
//! Durable persistence for the scoring core: an append-only event log with a
//! unique `(match_id, sequence_number)` index and hash-verified aggregate
//! snapshots, committed together in one transaction per command.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_STATE_BYTES;
pub use store::SqliteJournalMode;
pub use store::SqliteScoreStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
