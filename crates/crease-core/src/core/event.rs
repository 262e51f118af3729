// crates/crease-core/src/core/event.rs
// ============================================================================
// Module: Scoring Events
// Description: Raw append-only scoring events and their hash-chain envelope.
// Purpose: Define the atomic unit appended to the per-match event log.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every scoring action enters the system as a [`RawEvent`] appended to the
//! per-match log. Raw events are never deleted or rewritten; corrections and
//! dispute resolutions are themselves events. Payloads are tagged variants
//! with a `kind` discriminator and an `extensions` bag for forward-compatible
//! fields, validated at ingress before persistence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::ball::BallNumber;
use crate::core::ball::BallOutcome;
use crate::core::ball::WicketDetail;
use crate::core::identifiers::BallId;
use crate::core::identifiers::DisputeId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::OverId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Scorer Side
// ============================================================================

/// Which party a scorer represents for consensus purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerSide {
    /// Scorer for the home side (team A).
    Home,
    /// Scorer for the away side (team B).
    Away,
    /// Neutral official; umpire events override scorer consensus.
    Umpire,
}

// ============================================================================
// SECTION: Event Payloads
// ============================================================================

/// Ball submission carried inside a `ball_recorded` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallSubmission {
    /// Owning innings.
    pub innings_id: InningsId,
    /// Owning over.
    pub over_id: OverId,
    /// Logical ball coordinate.
    pub number: BallNumber,
    /// Bowler of the delivery.
    pub bowler: PlayerId,
    /// Batsman on strike.
    pub striker: PlayerId,
    /// Batsman at the non-striker's end, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker: Option<PlayerId>,
    /// Claimed delivery outcome.
    pub outcome: BallOutcome,
    /// Optional shot metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_kind: Option<String>,
    /// Optional fielding-position metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielding_position: Option<String>,
}

/// Kind-specific payload of a raw scoring event.
///
/// # Invariants
/// - Variant names are stable wire discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A scorer recorded one delivery.
    BallRecorded {
        /// The submitted delivery.
        submission: BallSubmission,
    },
    /// A scorer recorded a dismissal against an already-submitted delivery.
    WicketRecorded {
        /// Owning innings.
        innings_id: InningsId,
        /// Logical ball the dismissal belongs to.
        number: BallNumber,
        /// Claimed dismissal detail.
        wicket: WicketDetail,
    },
    /// A new over was opened with its bowler.
    OverOpened {
        /// Owning innings.
        innings_id: InningsId,
        /// Over identifier allocated for the new over.
        over_id: OverId,
        /// Over number (1-based).
        over_number: u32,
        /// Bowler for the over.
        bowler: PlayerId,
    },
    /// A new innings was opened.
    InningsOpened {
        /// Innings identifier allocated for the new innings.
        innings_id: InningsId,
        /// Innings ordinal within the match (1-based).
        innings_number: u8,
        /// Batting side.
        batting_team: TeamId,
        /// Bowling side.
        bowling_team: TeamId,
        /// Chase target, for the second and later innings.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<u32>,
    },
    /// An innings was closed (declared or administratively ended).
    InningsClosed {
        /// Innings being closed.
        innings_id: InningsId,
        /// Whether the close is a declaration.
        declared: bool,
    },
    /// Current batsmen were assigned (new batsman in, or openers).
    BatsmenSet {
        /// Owning innings.
        innings_id: InningsId,
        /// Batsman taking strike.
        striker: PlayerId,
        /// Batsman at the non-striker's end, when assigned.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        non_striker: Option<PlayerId>,
    },
    /// Current bowler was assigned.
    BowlerSet {
        /// Owning innings.
        innings_id: InningsId,
        /// Bowler taking the next over.
        bowler: PlayerId,
    },
    /// A correction referencing an earlier committed ball.
    Correction {
        /// Canonical ball being corrected.
        original_ball: BallId,
        /// Replacement outcome claimed by the scorer.
        submission: BallSubmission,
    },
    /// A dispute was opened between disagreeing scorer events.
    DisputeRaised {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Logical ball under dispute.
        number: BallNumber,
    },
    /// An authorised resolver settled a dispute with a final payload.
    DisputeResolved {
        /// Dispute being resolved.
        dispute_id: DisputeId,
        /// Final outcome to commit canonically.
        final_outcome: BallOutcome,
    },
}

impl EventPayload {
    /// Stable wire name of the payload kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::BallRecorded {
                ..
            } => "ball_recorded",
            Self::WicketRecorded {
                ..
            } => "wicket_recorded",
            Self::OverOpened {
                ..
            } => "over_opened",
            Self::InningsOpened {
                ..
            } => "innings_opened",
            Self::InningsClosed {
                ..
            } => "innings_closed",
            Self::BatsmenSet {
                ..
            } => "batsmen_set",
            Self::BowlerSet {
                ..
            } => "bowler_set",
            Self::Correction {
                ..
            } => "correction",
            Self::DisputeRaised {
                ..
            } => "dispute_raised",
            Self::DisputeResolved {
                ..
            } => "dispute_resolved",
        }
    }
}

// ============================================================================
// SECTION: Raw Event
// ============================================================================

/// One immutable entry of the per-match event log.
///
/// # Invariants
/// - `sequence` is dense and 1-based per match.
/// - `prior_hash` equals the previous event's `event_hash`, or the chain
///   sentinel for the first event.
/// - `signature` is stored verbatim and never interpreted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Owning match.
    pub match_id: MatchId,
    /// Monotonic, gap-free sequence number within the match.
    pub sequence: u64,
    /// Scorer who recorded the event.
    pub scorer_id: UserId,
    /// Side the scorer represents.
    pub scorer_side: ScorerSide,
    /// Kind-specific payload.
    pub payload: EventPayload,
    /// Hash of the previous event in the chain.
    pub prior_hash: String,
    /// Chained hash of this event.
    pub event_hash: String,
    /// Scorer's HMAC signature over the canonical payload bytes.
    pub signature: String,
    /// Instant the scorer recorded the event.
    pub event_timestamp: Timestamp,
    /// Forward-compatible extension fields captured at ingress.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

// ============================================================================
// SECTION: Chain Bookkeeping
// ============================================================================

/// In-memory tail of a match's event chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTail {
    /// Sequence number of the last appended event (0 when empty).
    pub last_sequence: u64,
    /// Hash of the last appended event (chain sentinel when empty).
    pub last_hash: String,
}

impl ChainTail {
    /// Tail of an empty chain.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            last_sequence: 0,
            last_hash: String::from(crate::core::hashing::CHAIN_SENTINEL),
        }
    }
}

/// Outcome of a full chain verification scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAudit {
    /// Whether every link verified.
    pub intact: bool,
    /// Number of events scanned.
    pub scanned: u64,
    /// Sequence of the first broken link, when the chain is not intact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_break: Option<u64>,
}

impl ChainAudit {
    /// Audit result for an intact chain of `scanned` events.
    #[must_use]
    pub const fn intact(scanned: u64) -> Self {
        Self {
            intact: true,
            scanned,
            first_break: None,
        }
    }

    /// Audit result with the first break at `sequence`.
    #[must_use]
    pub const fn broken_at(scanned: u64, sequence: u64) -> Self {
        Self {
            intact: false,
            scanned,
            first_break: Some(sequence),
        }
    }
}
