// crates/crease-core/src/core/projection.rs
// ============================================================================
// Module: Match Projection
// Description: Derived innings, batsman, and bowler aggregates.
// Purpose: Hold the deterministic fold of canonical balls served to spectators.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The projection is everything spectators see: innings totals, the over in
//! progress, per-batsman and per-bowler aggregates, and the fall-of-wicket
//! sequence. It is produced only by the projector folding committed canonical
//! balls and administrative events; the same log prefix always yields a
//! byte-identical projection. Ratios with zero denominators are reported as
//! unavailable rather than zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ball::BallNumber;
use crate::core::ball::CanonicalBall;
use crate::core::ball::DismissalKind;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::PlayerId;
use crate::core::innings::InningsState;
use crate::core::innings::OverState;

// ============================================================================
// SECTION: Batting Aggregates
// ============================================================================

/// Derived batting aggregate for one batsman in one innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatsmanAggregate {
    /// Batsman identity.
    pub player_id: PlayerId,
    /// Runs scored off the bat.
    pub runs: u32,
    /// Legal deliveries faced.
    pub balls_faced: u32,
    /// Boundaries hit along the ground.
    pub fours: u32,
    /// Boundaries hit over the rope.
    pub sixes: u32,
    /// Dismissal, once out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<DismissalKind>,
}

impl BatsmanAggregate {
    /// Fresh aggregate for a batsman arriving at the crease.
    #[must_use]
    pub const fn fresh(player_id: PlayerId) -> Self {
        Self {
            player_id,
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            out: None,
        }
    }

    /// Strike rate (runs per hundred balls), unavailable before the first ball.
    #[must_use]
    pub fn strike_rate(&self) -> Option<f64> {
        if self.balls_faced == 0 {
            return None;
        }
        Some(f64::from(self.runs) * 100.0 / f64::from(self.balls_faced))
    }
}

// ============================================================================
// SECTION: Bowling Aggregates
// ============================================================================

/// Derived bowling aggregate for one bowler in one innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerAggregate {
    /// Bowler identity.
    pub player_id: PlayerId,
    /// Legal deliveries bowled.
    pub balls_bowled: u32,
    /// Runs conceded (off the bat plus credited extras).
    pub runs_conceded: u32,
    /// Wickets credited.
    pub wickets: u32,
    /// Completed maiden overs.
    pub maidens: u32,
    /// Wickets on consecutive legal deliveries, for hat-trick detection.
    pub consecutive_wicket_balls: u32,
}

impl BowlerAggregate {
    /// Fresh aggregate for a bowler entering the attack.
    #[must_use]
    pub const fn fresh(player_id: PlayerId) -> Self {
        Self {
            player_id,
            balls_bowled: 0,
            runs_conceded: 0,
            wickets: 0,
            maidens: 0,
            consecutive_wicket_balls: 0,
        }
    }

    /// Economy in runs per six-ball over, unavailable before the first ball.
    #[must_use]
    pub fn economy(&self) -> Option<f64> {
        if self.balls_bowled == 0 {
            return None;
        }
        Some(f64::from(self.runs_conceded) * 6.0 / f64::from(self.balls_bowled))
    }
}

// ============================================================================
// SECTION: Fall of Wicket
// ============================================================================

/// One entry of the fall-of-wicket sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallOfWicket {
    /// Ordinal of the wicket (1-based).
    pub wicket_number: u8,
    /// Team score when the wicket fell.
    pub score: u32,
    /// Logical ball the wicket fell on.
    pub number: BallNumber,
    /// Batsman dismissed.
    pub batsman_out: PlayerId,
    /// Runs added by the broken partnership.
    pub partnership_runs: u32,
}

// ============================================================================
// SECTION: Innings Projection
// ============================================================================

/// Full derived view of one innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsProjection {
    /// Progression state and totals.
    pub state: InningsState,
    /// Overs keyed by over number.
    pub overs: BTreeMap<u32, OverState>,
    /// Batting aggregates keyed by batsman.
    pub batsmen: BTreeMap<PlayerId, BatsmanAggregate>,
    /// Bowling aggregates keyed by bowler.
    pub bowlers: BTreeMap<PlayerId, BowlerAggregate>,
    /// Fall-of-wicket sequence in order.
    pub fall_of_wickets: Vec<FallOfWicket>,
    /// Canonical balls committed to this innings, in commit order.
    pub balls: Vec<CanonicalBall>,
    /// Score at the fall of the last wicket, for partnership arithmetic.
    pub score_at_last_wicket: u32,
}

impl InningsProjection {
    /// Creates an empty projection around an opening innings state.
    #[must_use]
    pub fn open(state: InningsState) -> Self {
        Self {
            state,
            overs: BTreeMap::new(),
            batsmen: BTreeMap::new(),
            bowlers: BTreeMap::new(),
            fall_of_wickets: Vec::new(),
            balls: Vec::new(),
            score_at_last_wicket: 0,
        }
    }

    /// Scoreboard string `runs/wickets`, e.g. `45/3`.
    #[must_use]
    pub fn score_line(&self) -> String {
        format!("{}/{}", self.state.total_runs, self.state.wickets_fallen)
    }

    /// Overs string `over.ball`, e.g. `12.4`.
    #[must_use]
    pub fn overs_line(&self) -> String {
        let completed_overs = self.state.current_over.saturating_sub(1);
        format!("{}.{}", completed_overs, self.state.ball_in_over)
    }
}

// ============================================================================
// SECTION: Match Projection
// ============================================================================

/// Derived view of a whole match: one projection per opened innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchProjection {
    /// Innings projections keyed by innings identifier.
    pub innings: BTreeMap<InningsId, InningsProjection>,
    /// Innings in opening order.
    pub innings_order: Vec<InningsId>,
    /// Sequence number of the last event applied to this projection.
    pub applied_sequence: u64,
    /// Sequence number of the last canonical commit broadcast to rooms.
    pub last_committed_sequence: u64,
}

impl MatchProjection {
    /// Returns the most recently opened innings projection, when any.
    #[must_use]
    pub fn current_innings(&self) -> Option<&InningsProjection> {
        self.innings_order.last().and_then(|id| self.innings.get(id))
    }

    /// Mutable access to the most recently opened innings projection.
    #[must_use]
    pub fn current_innings_mut(&mut self) -> Option<&mut InningsProjection> {
        let id = *self.innings_order.last()?;
        self.innings.get_mut(&id)
    }

    /// Returns the innings projection by identifier.
    #[must_use]
    pub fn innings_by_id(&self, innings_id: InningsId) -> Option<&InningsProjection> {
        self.innings.get(&innings_id)
    }

    /// Number of completed innings.
    #[must_use]
    pub fn completed_innings(&self) -> usize {
        self.innings.values().filter(|innings| innings.state.completed).count()
    }
}
