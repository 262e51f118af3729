// crates/crease-core/src/core/team.rs
// ============================================================================
// Module: Playing Sides
// Description: Playing XI entries and side-level validation.
// Purpose: Validate scoring preconditions on team composition before a match
// goes live.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A playing side is the set of players fielded by one team for one match,
//! with per-player role flags. Sides are validated when set and frozen once
//! the match enters the `Live` stage. Team roster management beyond these
//! preconditions is an external collaborator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::PlayerId;
use crate::core::rules::MatchRules;

// ============================================================================
// SECTION: Playing XI
// ============================================================================

/// One member of a playing XI with role flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayingXiEntry {
    /// Player identity.
    pub player_id: PlayerId,
    /// Whether the player may bat.
    pub can_bat: bool,
    /// Whether the player may bowl.
    pub can_bowl: bool,
    /// Whether the player keeps wicket.
    pub is_keeper: bool,
    /// Whether the player captains the side.
    pub is_captain: bool,
    /// Batting order position (1-based).
    pub batting_order: u8,
}

/// Validates a playing XI against the match rules.
///
/// Checks size, distinct members, exactly one captain, and (when the rules
/// require one) exactly one keeper.
///
/// # Errors
///
/// Returns [`PlayingXiError`] naming the first violated constraint.
pub fn validate_playing_xi(
    entries: &[PlayingXiEntry],
    rules: &MatchRules,
) -> Result<(), PlayingXiError> {
    if entries.len() != rules.players_per_side as usize {
        return Err(PlayingXiError::WrongSize {
            expected: rules.players_per_side,
            actual: entries.len(),
        });
    }
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.player_id) {
            return Err(PlayingXiError::DuplicatePlayer(entry.player_id));
        }
    }
    let captains = entries.iter().filter(|entry| entry.is_captain).count();
    if captains != 1 {
        return Err(PlayingXiError::CaptainCount(captains));
    }
    if rules.require_keeper {
        let keepers = entries.iter().filter(|entry| entry.is_keeper).count();
        if keepers != 1 {
            return Err(PlayingXiError::KeeperCount(keepers));
        }
    }
    Ok(())
}

/// Returns the keeper of a side, when one is flagged.
#[must_use]
pub fn keeper_of(entries: &[PlayingXiEntry]) -> Option<PlayerId> {
    entries.iter().find(|entry| entry.is_keeper).map(|entry| entry.player_id)
}

/// Returns true when the side contains the player.
#[must_use]
pub fn side_contains(entries: &[PlayingXiEntry], player: PlayerId) -> bool {
    entries.iter().any(|entry| entry.player_id == player)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Violations in a submitted playing XI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayingXiError {
    /// Side size does not match the rules.
    #[error("playing XI must have {expected} players, got {actual}")]
    WrongSize {
        /// Required side size.
        expected: u8,
        /// Submitted side size.
        actual: usize,
    },
    /// A player appears more than once.
    #[error("player {0} listed more than once")]
    DuplicatePlayer(PlayerId),
    /// A side must have exactly one captain.
    #[error("playing XI must have exactly one captain, got {0}")]
    CaptainCount(usize),
    /// A side must have exactly one keeper when the rules require one.
    #[error("playing XI must have exactly one keeper, got {0}")]
    KeeperCount(usize),
}
