// crates/crease-core/src/core/rules.rs
// ============================================================================
// Module: Match Rules Configuration
// Description: Frozen per-match rules governing overs, sides, and consensus.
// Purpose: Key every rule-engine and consensus decision on explicit configuration.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A match carries one [`MatchRules`] value fixed at creation and frozen once
//! the match goes live. The rule engine, projector, and consensus engine are
//! all pure functions over these values, so tests can pin small deterministic
//! windows and unusual over lengths without touching engine code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Tie Break
// ============================================================================

/// Tie-break mode reported when a match ends with level scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMode {
    /// A super over decides the winner (recorded as metadata only).
    #[default]
    SuperOver,
    /// Boundary count decides the winner (recorded as metadata only).
    BoundaryCount,
    /// The tie stands and the match is shared.
    SharedTie,
}

// ============================================================================
// SECTION: Matching Window
// ============================================================================

/// Consensus matching window bounding the sibling-event search.
///
/// # Invariants
/// - `max_age_ms` and `max_events` are both consulted; the first exhausted
///   bound closes the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingWindow {
    /// Maximum age difference between sibling events, in milliseconds.
    pub max_age_ms: u64,
    /// Maximum number of trailing events searched for a sibling.
    pub max_events: u32,
}

impl Default for MatchingWindow {
    fn default() -> Self {
        Self {
            max_age_ms: 30_000,
            max_events: 8,
        }
    }
}

// ============================================================================
// SECTION: Match Rules
// ============================================================================

/// Rules configuration for one match.
///
/// # Invariants
/// - Frozen once the match enters the `Live` stage.
/// - All counts are 1-based and non-zero after [`MatchRules::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    /// Scheduled overs per innings.
    pub overs_per_innings: u16,
    /// Legal deliveries per over.
    pub balls_per_over: u8,
    /// Players per side in the playing XI.
    pub players_per_side: u8,
    /// Wickets that end an innings (all out).
    pub wickets_to_fall: u8,
    /// Number of innings in the match (one per side for limited overs).
    pub innings_count: u8,
    /// Powerplay prefix in overs (fielding-restriction metadata only).
    pub powerplay_overs: u8,
    /// Tie-break mode reported on level scores.
    pub tie_break: TieBreakMode,
    /// Whether a bowler may bowl consecutive overs.
    pub allow_same_bowler_consecutive: bool,
    /// Whether the playing XI must contain exactly one keeper.
    pub require_keeper: bool,
    /// Whether a lone scorer's event is accepted when the window expires.
    pub single_scorer_policy: bool,
    /// Consensus matching window.
    pub matching_window: MatchingWindow,
}

impl MatchRules {
    /// Standard T20 rules: 20 overs, 6 balls per over, 11 players, 10 wickets.
    #[must_use]
    pub fn t20() -> Self {
        Self {
            overs_per_innings: 20,
            balls_per_over: 6,
            players_per_side: 11,
            wickets_to_fall: 10,
            innings_count: 2,
            powerplay_overs: 6,
            tie_break: TieBreakMode::default(),
            allow_same_bowler_consecutive: false,
            require_keeper: true,
            single_scorer_policy: false,
            matching_window: MatchingWindow::default(),
        }
    }

    /// Total legal deliveries scheduled for one innings.
    #[must_use]
    pub const fn scheduled_deliveries(&self) -> u32 {
        self.overs_per_innings as u32 * self.balls_per_over as u32
    }

    /// Validates structural constraints on the rules.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] naming the first violated constraint.
    pub const fn validate(&self) -> Result<(), RulesError> {
        if self.overs_per_innings == 0 {
            return Err(RulesError::ZeroOvers);
        }
        if self.balls_per_over == 0 {
            return Err(RulesError::ZeroBallsPerOver);
        }
        if self.players_per_side < 2 {
            return Err(RulesError::TooFewPlayers);
        }
        if self.wickets_to_fall == 0 || self.wickets_to_fall >= self.players_per_side {
            return Err(RulesError::WicketCountOutOfRange);
        }
        if self.innings_count == 0 {
            return Err(RulesError::ZeroInnings);
        }
        if self.powerplay_overs as u16 > self.overs_per_innings {
            return Err(RulesError::PowerplayTooLong);
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::t20()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural violations in a rules configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    /// Overs per innings must be at least one.
    #[error("overs_per_innings must be at least 1")]
    ZeroOvers,
    /// Balls per over must be at least one.
    #[error("balls_per_over must be at least 1")]
    ZeroBallsPerOver,
    /// A side needs at least two players to bat.
    #[error("players_per_side must be at least 2")]
    TooFewPlayers,
    /// Wickets to fall must leave one not-out batsman.
    #[error("wickets_to_fall must be between 1 and players_per_side - 1")]
    WicketCountOutOfRange,
    /// At least one innings is required.
    #[error("innings_count must be at least 1")]
    ZeroInnings,
    /// Powerplay cannot exceed the scheduled overs.
    #[error("powerplay_overs cannot exceed overs_per_innings")]
    PowerplayTooLong,
}
