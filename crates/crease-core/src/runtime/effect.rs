// crates/crease-core/src/runtime/effect.rs
// ============================================================================
// Module: Delivery Effect
// Description: Pure mapping from delivery outcomes to scoring deltas.
// Purpose: Implement the extras table, strike rotation, milestones, and
// innings termination.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every rule that turns a ball into numbers lives here as a pure function:
//! the extras table, strike rotation, milestone detection, and the innings
//! termination predicate. The projector is the only caller; keeping these
//! separate keeps the fold auditable against the laws one table at a time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::ball::BallOutcome;
use crate::core::ball::ExtraKind;
use crate::core::identifiers::PlayerId;
use crate::core::innings::InningsEndReason;
use crate::core::innings::InningsState;
use crate::core::projection::BatsmanAggregate;
use crate::core::projection::BowlerAggregate;
use crate::core::rules::MatchRules;

// ============================================================================
// SECTION: Delivery Effect
// ============================================================================

/// Additive scoring deltas for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEffect {
    /// Runs credited to the striker.
    pub batsman_runs: u32,
    /// Runs credited to extras.
    pub extras_runs: u32,
    /// Whether the delivery counts as a legal ball of the over.
    pub is_legal: bool,
    /// Whether the striker is charged a ball faced.
    pub counts_ball_faced: bool,
    /// Whether the conceded runs are charged to the bowler.
    pub charges_bowler: bool,
}

impl DeliveryEffect {
    /// Total runs added to the innings.
    #[must_use]
    pub const fn total_runs(&self) -> u32 {
        self.batsman_runs + self.extras_runs
    }
}

/// Maps a claimed outcome to its scoring deltas per the extras table.
///
/// | extra      | legal | batsman credited | extras added          |
/// |------------|-------|------------------|-----------------------|
/// | none       | yes   | runs off bat     | 0                     |
/// | wide       | no    | 0                | 1 + additional runs   |
/// | no-ball    | no    | runs off bat     | 1 + byes or leg byes  |
/// | bye        | yes   | 0                | runs off bat          |
/// | leg bye    | yes   | 0                | runs off bat          |
/// | penalty    | no    | 0                | penalty runs          |
#[must_use]
pub const fn delivery_effect(outcome: &BallOutcome) -> DeliveryEffect {
    let (batsman_runs, extras_runs, charges_bowler) = match outcome.extra_kind {
        ExtraKind::None => (outcome.runs_off_bat, 0, true),
        ExtraKind::Wide => (0, 1 + outcome.extra_runs, true),
        ExtraKind::NoBall => (outcome.runs_off_bat, 1 + outcome.extra_runs, true),
        ExtraKind::Bye | ExtraKind::LegBye => (0, outcome.runs_off_bat, false),
        ExtraKind::Penalty => (0, outcome.extra_runs, false),
    };
    let is_legal = outcome.extra_kind.counts_as_legal();
    DeliveryEffect {
        batsman_runs,
        extras_runs,
        is_legal,
        counts_ball_faced: is_legal,
        charges_bowler,
    }
}

// ============================================================================
// SECTION: Strike Rotation
// ============================================================================

/// Runs physically ran between the wickets on this delivery.
///
/// Boundaries are not ran, so they never rotate strike; on a wide only the
/// additional runs beyond the automatic penalty are ran.
#[must_use]
pub const fn runs_ran(outcome: &BallOutcome) -> u32 {
    if outcome.is_boundary {
        return 0;
    }
    match outcome.extra_kind {
        ExtraKind::None | ExtraKind::NoBall | ExtraKind::Bye | ExtraKind::LegBye => {
            outcome.runs_off_bat
        }
        ExtraKind::Wide => outcome.extra_runs,
        ExtraKind::Penalty => 0,
    }
}

/// Returns true when the delivery itself swaps the batsmen (odd runs ran).
#[must_use]
pub const fn strike_swaps(outcome: &BallOutcome) -> bool {
    runs_ran(outcome) % 2 == 1
}

// ============================================================================
// SECTION: Milestones
// ============================================================================

/// A milestone achieved on one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    /// A batsman crossed a multiple of fifty.
    BatsmanRunsMark {
        /// Batsman achieving the mark.
        player_id: PlayerId,
        /// The mark crossed (50, 100, 150, ...).
        mark: u32,
        /// Runs after the delivery.
        runs: u32,
    },
    /// A bowler reached five wickets in the innings.
    BowlerFiveFor {
        /// Bowler achieving the haul.
        player_id: PlayerId,
        /// Wickets after the delivery.
        wickets: u32,
    },
    /// A bowler took wickets on three consecutive legal deliveries.
    HatTrick {
        /// Bowler achieving the hat-trick.
        player_id: PlayerId,
    },
}

/// Milestones crossed by a batting aggregate change.
#[must_use]
pub fn batting_milestones(before: &BatsmanAggregate, after: &BatsmanAggregate) -> Vec<Milestone> {
    let mut milestones = Vec::new();
    let mut mark = (before.runs / 50 + 1) * 50;
    while mark <= after.runs {
        milestones.push(Milestone::BatsmanRunsMark {
            player_id: after.player_id,
            mark,
            runs: after.runs,
        });
        mark += 50;
    }
    milestones
}

/// Milestones crossed by a bowling aggregate change.
#[must_use]
pub fn bowling_milestones(before: &BowlerAggregate, after: &BowlerAggregate) -> Vec<Milestone> {
    let mut milestones = Vec::new();
    if before.wickets < 5 && after.wickets >= 5 {
        milestones.push(Milestone::BowlerFiveFor {
            player_id: after.player_id,
            wickets: after.wickets,
        });
    }
    if after.consecutive_wicket_balls >= 3 && before.consecutive_wicket_balls < 3 {
        milestones.push(Milestone::HatTrick {
            player_id: after.player_id,
        });
    }
    milestones
}

// ============================================================================
// SECTION: Innings Termination
// ============================================================================

/// Returns the termination reason when the innings has just ended.
///
/// An innings terminates when all wickets have fallen, the scheduled
/// deliveries are exhausted, the chase target is strictly exceeded, or a
/// declaration was recorded.
#[must_use]
pub fn innings_terminates(state: &InningsState, rules: &MatchRules) -> Option<InningsEndReason> {
    if state.declared {
        return Some(InningsEndReason::Declared);
    }
    if state.wickets_fallen >= rules.wickets_to_fall {
        return Some(InningsEndReason::AllOut);
    }
    if let Some(target) = state.target {
        if state.total_runs > target {
            return Some(InningsEndReason::TargetChased);
        }
    }
    if state.legal_deliveries >= rules.scheduled_deliveries() {
        return Some(InningsEndReason::OversExhausted);
    }
    None
}
