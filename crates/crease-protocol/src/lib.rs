// crates/crease-protocol/src/lib.rs
// ============================================================================
// Module: Crease Protocol Library
// Description: Canonical wire shapes for commands, views, streams, and errors.
// Purpose: Keep every API surface on one stable contract over the core types.
// Dependencies: crease-core, serde
// ============================================================================

//! ## Overview
//! This crate owns the wire contract: command bodies posted to the command
//! API, view shapes served by queries, the `{type, timestamp, data}` stream
//! envelope fanned out to match rooms, and the error taxonomy. The server
//! converts between these shapes and the core aggregate; nothing here holds
//! behavior.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod commands;
pub mod error;
pub mod stream;
pub mod views;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use commands::BallSubmit;
pub use commands::DisputeResolveRequest;
pub use commands::InningsCloseRequest;
pub use commands::InningsCreate;
pub use commands::MatchCreate;
pub use commands::OfficialEntry;
pub use commands::OfficialRoleBody;
pub use commands::OverCreate;
pub use commands::PlayingXiEntryBody;
pub use commands::PlayingXiRequest;
pub use commands::SetBatsmenRequest;
pub use commands::SetBowlerRequest;
pub use commands::TossRequest;
pub use commands::WicketBody;
pub use error::ErrorBody;
pub use error::ErrorCode;
pub use stream::StreamMessage;
pub use stream::StreamMessageKind;
pub use views::BallStatus;
pub use views::BallView;
pub use views::BatsmanView;
pub use views::BowlerView;
pub use views::DisputeView;
pub use views::EventView;
pub use views::InningsView;
pub use views::MatchSnapshotView;
pub use views::MatchView;
pub use views::OverView;
