// crates/crease-core/src/core/dispute.rs
// ============================================================================
// Module: Disputes and Consensus
// Description: Records for scorer disagreement and the decisions that unify them.
// Purpose: Capture the dual-scorer dispute lifecycle and consensus outcomes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! When independent scorers disagree about a ball, a [`Dispute`] records both
//! claims and a machine-built difference summary. Every canonical commit is
//! justified by a [`ConsensusRecord`] naming the raw events it unifies, the
//! method that decided it, and the authority behind the decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::ball::BallNumber;
use crate::core::ball::BallOutcome;
use crate::core::identifiers::ConsensusId;
use crate::core::identifiers::DisputeId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Dispute
// ============================================================================

/// Classification of a scoring dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeKind {
    /// Scorers disagree on runs.
    RunsDiffer,
    /// Scorers disagree on the wicket or its detail.
    WicketDiffer,
    /// Scorers disagree on the extra classification.
    ExtraKindDiffer,
    /// One scorer's event is missing past the matching window.
    Missing,
}

/// Lifecycle status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Awaiting resolution.
    Open,
    /// Settled by an authorised resolver.
    Resolved,
    /// Abandoned along with the match.
    Abandoned,
}

/// One scorer's claim captured inside a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeClaim {
    /// Raw event carrying the claim.
    pub event_id: EventId,
    /// Scorer who made the claim.
    pub scorer_id: UserId,
    /// Claimed delivery outcome.
    pub outcome: BallOutcome,
}

/// Record of a scoring conflict and its resolution.
///
/// # Invariants
/// - References at least two raw events targeting the same logical ball,
///   except `Missing` disputes which reference one.
/// - `resolved_at`, `resolver_id`, and `final_outcome` are set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Dispute identifier.
    pub dispute_id: DisputeId,
    /// Owning match.
    pub match_id: MatchId,
    /// Owning innings.
    pub innings_id: InningsId,
    /// Logical ball under dispute.
    pub number: BallNumber,
    /// Dispute classification.
    pub kind: DisputeKind,
    /// Lifecycle status.
    pub status: DisputeStatus,
    /// Conflicting scorer claims.
    pub claims: Vec<DisputeClaim>,
    /// Machine-built summary of the disagreeing fields.
    pub difference_summary: String,
    /// Instant the dispute was opened.
    pub opened_at: Timestamp,
    /// Instant the dispute was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    /// Authorised resolver who settled the dispute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_id: Option<UserId>,
    /// Final outcome committed on resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<BallOutcome>,
    /// Resolution latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

// ============================================================================
// SECTION: Consensus
// ============================================================================

/// Method by which consensus over a ball was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    /// Independent scorers agreed on all consensus-relevant fields.
    ScorerMatch,
    /// An umpire-side event overrode scorer claims.
    UmpireOverride,
    /// A lone scorer's claim was accepted after the window expired.
    SingleScorerAccepted,
    /// An authorised resolver settled a dispute manually.
    ManualResolution,
}

impl ConsensusMethod {
    /// Confidence assigned to commits decided by this method.
    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::ScorerMatch | Self::UmpireOverride | Self::ManualResolution => 1.0,
            Self::SingleScorerAccepted => 0.5,
        }
    }
}

/// Record justifying one canonical ball commit.
///
/// # Invariants
/// - `event_ids` name every raw event unified by this decision.
/// - `applied_to_ball` is set once the projector commits the canonical ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    /// Consensus identifier.
    pub consensus_id: ConsensusId,
    /// Owning match.
    pub match_id: MatchId,
    /// Owning innings.
    pub innings_id: InningsId,
    /// Logical ball decided.
    pub number: BallNumber,
    /// Raw events unified by this decision.
    pub event_ids: Vec<EventId>,
    /// Decision method.
    pub method: ConsensusMethod,
    /// Decision confidence in `[0, 1]`.
    pub confidence: f64,
    /// Canonical outcome decided.
    pub outcome: BallOutcome,
    /// Whether the projector committed the canonical ball.
    pub applied_to_ball: bool,
    /// Authority behind the decision, for overrides and manual resolutions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_id: Option<UserId>,
    /// Instant the decision was made.
    pub decided_at: Timestamp,
}
