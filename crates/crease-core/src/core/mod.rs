// crates/crease-core/src/core/mod.rs
// ============================================================================
// Module: Crease Core Types
// Description: Canonical cricket scoring schema and match-state structures.
// Purpose: Provide stable, serializable types for events, balls, and projections.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Crease core types define the raw scoring event log, the canonical ball
//! model, match rules and lifecycle records, disputes and consensus records,
//! and the derived projection. These types are the canonical source of truth
//! for any derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ball;
pub mod dispute;
pub mod event;
pub mod hashing;
pub mod identifiers;
pub mod innings;
pub mod match_state;
pub mod projection;
pub mod rules;
pub mod team;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ball::BallNumber;
pub use ball::BallNumberParseError;
pub use ball::BallOutcome;
pub use ball::BoundaryKind;
pub use ball::CanonicalBall;
pub use ball::DismissalKind;
pub use ball::ExtraKind;
pub use ball::WicketDetail;
pub use ball::WicketRecord;
pub use dispute::ConsensusMethod;
pub use dispute::ConsensusRecord;
pub use dispute::Dispute;
pub use dispute::DisputeClaim;
pub use dispute::DisputeKind;
pub use dispute::DisputeStatus;
pub use event::BallSubmission;
pub use event::ChainAudit;
pub use event::ChainTail;
pub use event::EventPayload;
pub use event::RawEvent;
pub use event::ScorerSide;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::BallId;
pub use identifiers::ConsensusId;
pub use identifiers::CorrelationId;
pub use identifiers::DisputeId;
pub use identifiers::EventId;
pub use identifiers::InningsId;
pub use identifiers::MatchId;
pub use identifiers::OverId;
pub use identifiers::PlayerId;
pub use identifiers::TeamId;
pub use identifiers::UserId;
pub use innings::InningsEndReason;
pub use innings::InningsState;
pub use innings::OverState;
pub use match_state::ConsensusState;
pub use match_state::MatchOfficial;
pub use match_state::MatchRecord;
pub use match_state::MatchResult;
pub use match_state::MatchStage;
pub use match_state::MatchState;
pub use match_state::OfficialRole;
pub use match_state::PendingClaim;
pub use match_state::TossElection;
pub use match_state::TossOutcome;
pub use match_state::WinMargin;
pub use projection::BatsmanAggregate;
pub use projection::BowlerAggregate;
pub use projection::FallOfWicket;
pub use projection::InningsProjection;
pub use projection::MatchProjection;
pub use rules::MatchRules;
pub use rules::MatchingWindow;
pub use rules::RulesError;
pub use rules::TieBreakMode;
pub use team::PlayingXiEntry;
pub use team::PlayingXiError;
pub use team::keeper_of;
pub use team::side_contains;
pub use team::validate_playing_xi;
pub use time::Timestamp;
