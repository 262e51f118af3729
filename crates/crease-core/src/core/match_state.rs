// crates/crease-core/src/core/match_state.rs
// ============================================================================
// Module: Match Record and Aggregate State
// Description: Match setup, lifecycle stage, officials, and the per-match aggregate.
// Purpose: Capture everything a match owns, replayable from its event log.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`MatchRecord`] holds the setup a match is created with: the two sides,
//! the frozen rules, the toss, playing XIs, and the registered officials.
//! [`MatchState`] is the full per-match aggregate the scoring engine mutates
//! under the match lock and stores save wholesale: record, projection,
//! consensus working state, dispute log, and the event-chain tail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ball::BallNumber;
use crate::core::ball::BallOutcome;
use crate::core::dispute::ConsensusRecord;
use crate::core::dispute::Dispute;
use crate::core::event::ChainTail;
use crate::core::event::ScorerSide;
use crate::core::identifiers::BallId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::UserId;
use crate::core::projection::MatchProjection;
use crate::core::rules::MatchRules;
use crate::core::team::PlayingXiEntry;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Lifecycle Stage
// ============================================================================

/// Lifecycle stage of a match.
///
/// # Invariants
/// - Transitions form the fixed DAG enforced by the lifecycle module.
/// - Rules and playing XIs are frozen once the stage is `Live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// Created, awaiting toss and playing XIs.
    Scheduled,
    /// Toss recorded, awaiting playing XIs.
    TossPending,
    /// Scoring in progress.
    Live,
    /// Between innings.
    InningsBreak,
    /// All innings played.
    Completed,
    /// Abandoned before completion.
    Abandoned,
}

impl MatchStage {
    /// Stable wire name of the stage.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::TossPending => "toss_pending",
            Self::Live => "live",
            Self::InningsBreak => "innings_break",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Toss
// ============================================================================

/// What the toss winner elected to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossElection {
    /// Bat first.
    Bat,
    /// Bowl first.
    Bowl,
}

/// Recorded toss outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TossOutcome {
    /// Team that won the toss.
    pub won_by: TeamId,
    /// What the winner elected.
    pub elected: TossElection,
    /// Instant the toss was recorded.
    pub conducted_at: Timestamp,
}

// ============================================================================
// SECTION: Officials
// ============================================================================

/// Role of a registered match official.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum OfficialRole {
    /// Scorer for one side (or neutral umpire scoring).
    Scorer {
        /// Side the scorer represents.
        side: ScorerSide,
    },
    /// Match official who may resolve disputes and drive the lifecycle.
    Official,
    /// Team captain, for playing XI submission.
    Captain {
        /// Team the captain leads.
        team: TeamId,
    },
}

/// A registered official of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOfficial {
    /// Caller identity of the official.
    pub user_id: UserId,
    /// Role the official holds for this match.
    pub role: OfficialRole,
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// Margin by which a match was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WinMargin {
    /// Chasing side won with wickets in hand.
    Wickets {
        /// Wickets remaining.
        wickets: u8,
    },
    /// Defending side won by runs.
    Runs {
        /// Run difference.
        runs: u32,
    },
    /// Scores finished level; the tie-break mode is reported as metadata.
    Tie,
}

/// Final result of a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Winning team, absent on a tie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<TeamId>,
    /// Winning margin.
    pub margin: WinMargin,
}

// ============================================================================
// SECTION: Match Record
// ============================================================================

/// Setup and lifecycle record for one match.
///
/// # Invariants
/// - `team_a != team_b`.
/// - `rules` are frozen once `stage` is `Live`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Match identifier.
    pub match_id: MatchId,
    /// First party (home side).
    pub team_a: TeamId,
    /// Second party (away side).
    pub team_b: TeamId,
    /// Rules configuration.
    pub rules: MatchRules,
    /// Toss outcome, once conducted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toss: Option<TossOutcome>,
    /// Lifecycle stage.
    pub stage: MatchStage,
    /// Caller identity of the match creator.
    pub created_by: UserId,
    /// Playing XI per team, keyed by team identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub playing_xi: BTreeMap<TeamId, Vec<PlayingXiEntry>>,
    /// Registered officials.
    pub officials: Vec<MatchOfficial>,
    /// Final result, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    /// Instant the match was created.
    pub created_at: Timestamp,
}

impl MatchRecord {
    /// Returns the scorer side registered for a caller, when any.
    #[must_use]
    pub fn scorer_side_of(&self, user_id: UserId) -> Option<ScorerSide> {
        self.officials.iter().find_map(|official| match official.role {
            OfficialRole::Scorer {
                side,
            } if official.user_id == user_id => Some(side),
            _ => None,
        })
    }

    /// Returns true when the caller is a registered match official.
    #[must_use]
    pub fn is_official(&self, user_id: UserId) -> bool {
        self.officials
            .iter()
            .any(|official| official.user_id == user_id && matches!(official.role, OfficialRole::Official))
    }

    /// Returns true when the caller captains the given team for this match.
    #[must_use]
    pub fn is_captain_of(&self, user_id: UserId, team: TeamId) -> bool {
        self.officials.iter().any(|official| {
            official.user_id == user_id
                && matches!(official.role, OfficialRole::Captain { team: captained } if captained == team)
        })
    }

    /// Number of active scorers registered for the match.
    #[must_use]
    pub fn active_scorer_count(&self) -> usize {
        self.officials
            .iter()
            .filter(|official| matches!(official.role, OfficialRole::Scorer { .. }))
            .count()
    }

    /// Returns the side of the match the team plays on, when it belongs.
    #[must_use]
    pub fn side_of_team(&self, team: TeamId) -> Option<ScorerSide> {
        if team == self.team_a {
            Some(ScorerSide::Home)
        } else if team == self.team_b {
            Some(ScorerSide::Away)
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Consensus Working State
// ============================================================================

/// One scorer's pending claim awaiting a sibling or the window expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClaim {
    /// Raw event carrying the claim.
    pub event_id: EventId,
    /// Innings the claim addresses.
    pub innings_id: InningsId,
    /// Scorer who made the claim.
    pub scorer_id: UserId,
    /// Side the scorer represents.
    pub scorer_side: ScorerSide,
    /// Claimed outcome.
    pub outcome: BallOutcome,
    /// Optional shot metadata from the submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_kind: Option<String>,
    /// Optional fielding metadata from the submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielding_position: Option<String>,
    /// Sequence of the raw event, for window-by-count checks.
    pub sequence: u64,
    /// Instant the claim was recorded.
    pub recorded_at: Timestamp,
}

/// Consensus working state carried inside the match aggregate.
///
/// # Invariants
/// - `pending` holds at most one claim per scorer per logical ball.
/// - `held` commits are released strictly in logical ball order once no
///   earlier dispute remains open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConsensusState {
    /// Pending claims keyed by logical ball.
    pub pending: BTreeMap<BallNumber, Vec<PendingClaim>>,
    /// Consensus decisions held behind earlier open disputes.
    pub held: BTreeMap<BallNumber, ConsensusRecord>,
    /// Pending correction claims keyed by the canonical ball they replace.
    pub pending_corrections: BTreeMap<BallId, Vec<PendingClaim>>,
}

// ============================================================================
// SECTION: Match Aggregate
// ============================================================================

/// Full per-match aggregate mutated under the match lock.
///
/// # Invariants
/// - Replaying the raw event log deterministically reproduces everything
///   here except `record` setup fields supplied at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    /// Match setup and lifecycle record.
    pub record: MatchRecord,
    /// Derived projection over committed canonical balls.
    pub projection: MatchProjection,
    /// Consensus working state.
    pub consensus: ConsensusState,
    /// Dispute log, open and settled.
    pub disputes: Vec<Dispute>,
    /// Consensus decision log.
    pub consensus_log: Vec<ConsensusRecord>,
    /// Event-chain tail for the next append.
    pub chain_tail: ChainTail,
}

impl MatchState {
    /// Creates the aggregate for a freshly created match.
    #[must_use]
    pub fn new(record: MatchRecord) -> Self {
        Self {
            record,
            projection: MatchProjection::default(),
            consensus: ConsensusState::default(),
            disputes: Vec::new(),
            consensus_log: Vec::new(),
            chain_tail: ChainTail::empty(),
        }
    }

    /// Returns the earliest logical ball with an open dispute, when any.
    #[must_use]
    pub fn earliest_open_dispute(&self) -> Option<BallNumber> {
        self.disputes
            .iter()
            .filter(|dispute| dispute.status == crate::core::dispute::DisputeStatus::Open)
            .map(|dispute| dispute.number)
            .min()
    }
}
