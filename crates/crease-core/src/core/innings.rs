// crates/crease-core/src/core/innings.rs
// ============================================================================
// Module: Innings and Overs
// Description: Innings progression state and per-over aggregates.
// Purpose: Hold the derived cursor and totals the projector maintains per innings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Innings and over state is derived: the projector folds canonical balls and
//! administrative events into these records, and the same fold over the same
//! log prefix always reproduces them byte for byte. Nothing here is mutated
//! outside the projector.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::OverId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::TeamId;

// ============================================================================
// SECTION: Innings End Reasons
// ============================================================================

/// Why an innings terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsEndReason {
    /// All wickets fell.
    AllOut,
    /// The scheduled overs were exhausted.
    OversExhausted,
    /// The chase target was strictly exceeded.
    TargetChased,
    /// The batting captain declared.
    Declared,
}

// ============================================================================
// SECTION: Innings State
// ============================================================================

/// Derived progression state for one innings.
///
/// # Invariants
/// - `batting_team != bowling_team`; both are playing sides of the match.
/// - `ball_in_over` counts completed legal deliveries of the current over,
///   in `0..balls_per_over`.
/// - No canonical ball is applied after `completed` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsState {
    /// Innings identifier.
    pub innings_id: InningsId,
    /// Owning match.
    pub match_id: MatchId,
    /// Innings ordinal within the match (1-based).
    pub innings_number: u8,
    /// Batting side.
    pub batting_team: TeamId,
    /// Bowling side.
    pub bowling_team: TeamId,
    /// Total runs scored, including extras.
    pub total_runs: u32,
    /// Wickets fallen.
    pub wickets_fallen: u8,
    /// Total extras conceded.
    pub extras_total: u32,
    /// Current over number (1-based; the over in progress or about to start).
    pub current_over: u32,
    /// Completed legal deliveries in the current over.
    pub ball_in_over: u8,
    /// Batsman on strike.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub striker: Option<PlayerId>,
    /// Batsman at the non-striker's end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker: Option<PlayerId>,
    /// Bowler of the current over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bowler: Option<PlayerId>,
    /// Bowler of the previous over, for the consecutive-over restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_bowler: Option<PlayerId>,
    /// Chase target; the innings completes when `total_runs` exceeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Whether the innings has completed.
    pub completed: bool,
    /// Whether the side was bowled out.
    pub all_out: bool,
    /// Whether the innings was declared closed.
    pub declared: bool,
    /// Termination reason, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<InningsEndReason>,
    /// Legal deliveries bowled across the whole innings.
    pub legal_deliveries: u32,
}

impl InningsState {
    /// Creates the opening state for a new innings.
    #[must_use]
    pub fn open(
        innings_id: InningsId,
        match_id: MatchId,
        innings_number: u8,
        batting_team: TeamId,
        bowling_team: TeamId,
        target: Option<u32>,
    ) -> Self {
        Self {
            innings_id,
            match_id,
            innings_number,
            batting_team,
            bowling_team,
            total_runs: 0,
            wickets_fallen: 0,
            extras_total: 0,
            current_over: 1,
            ball_in_over: 0,
            striker: None,
            non_striker: None,
            current_bowler: None,
            previous_bowler: None,
            target,
            completed: false,
            all_out: false,
            declared: false,
            end_reason: None,
            legal_deliveries: 0,
        }
    }

    /// Current run rate in runs per over, when any legal ball has been bowled.
    #[must_use]
    pub fn run_rate(&self, balls_per_over: u8) -> Option<f64> {
        if self.legal_deliveries == 0 {
            return None;
        }
        let overs = f64::from(self.legal_deliveries) / f64::from(balls_per_over);
        Some(f64::from(self.total_runs) / overs)
    }

    /// Runs still required to win a chase, when a target is set.
    #[must_use]
    pub fn runs_required(&self) -> Option<u32> {
        let target = self.target?;
        Some(target.saturating_add(1).saturating_sub(self.total_runs))
    }
}

// ============================================================================
// SECTION: Over State
// ============================================================================

/// Derived aggregates for one over.
///
/// # Invariants
/// - `completed` iff `legal_deliveries` reached the over length or the
///   innings completed mid-over.
/// - `maiden` is decided only at completion, with zero runs conceded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverState {
    /// Over identifier.
    pub over_id: OverId,
    /// Owning innings.
    pub innings_id: InningsId,
    /// Over number (1-based).
    pub over_number: u32,
    /// Bowler of the over.
    pub bowler: PlayerId,
    /// Legal deliveries bowled.
    pub legal_deliveries: u8,
    /// Runs conceded, including extras.
    pub runs_conceded: u32,
    /// Wickets taken in the over.
    pub wickets_taken: u8,
    /// Extras conceded in the over.
    pub extras_in_over: u32,
    /// Ball symbols in delivery order (`0`, `1`, `4`, `W`, `wd`, `nb`, ...).
    pub symbols: Vec<String>,
    /// Whether the completed over conceded no runs.
    pub maiden: bool,
    /// Whether the over has completed.
    pub completed: bool,
}

impl OverState {
    /// Creates the opening state for a new over.
    #[must_use]
    pub const fn open(
        over_id: OverId,
        innings_id: InningsId,
        over_number: u32,
        bowler: PlayerId,
    ) -> Self {
        Self {
            over_id,
            innings_id,
            over_number,
            bowler,
            legal_deliveries: 0,
            runs_conceded: 0,
            wickets_taken: 0,
            extras_in_over: 0,
            symbols: Vec::new(),
            maiden: false,
            completed: false,
        }
    }
}
