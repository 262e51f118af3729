// crates/crease-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Match Lifecycle
// Description: State machine for match stages, toss, and playing XIs.
// Purpose: Enforce the fixed transition DAG and freeze setup at go-live.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Match stages move only along the fixed DAG: scheduled matches take playing
//! XIs and a toss, the toss makes the match toss-pending, completing both XIs
//! while toss-pending takes it live, innings alternate with breaks, and any
//! stage short of completion can be abandoned. Rules and XIs freeze at
//! go-live. Every illegal transition is a tagged [`LifecycleError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::TeamId;
use crate::core::innings::InningsState;
use crate::core::match_state::MatchRecord;
use crate::core::match_state::MatchResult;
use crate::core::match_state::MatchStage;
use crate::core::match_state::TossElection;
use crate::core::match_state::TossOutcome;
use crate::core::match_state::WinMargin;
use crate::core::team::PlayingXiEntry;
use crate::core::team::PlayingXiError;
use crate::core::team::validate_playing_xi;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lifecycle violations surfaced as failed preconditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The action is not legal from the current stage.
    #[error("{action} is not legal while the match is {stage}")]
    InvalidTransition {
        /// Current match stage.
        stage: MatchStage,
        /// Attempted action name.
        action: &'static str,
    },
    /// The toss winner must be one of the match teams.
    #[error("toss winner {0} is not a party to this match")]
    TossWinnerNotInMatch(TeamId),
    /// The toss was already recorded.
    #[error("the toss has already been conducted")]
    TossAlreadyConducted,
    /// The team is not a party to this match.
    #[error("team {0} is not a party to this match")]
    TeamNotInMatch(TeamId),
    /// The submitted playing XI is invalid.
    #[error(transparent)]
    PlayingXi(#[from] PlayingXiError),
    /// Another innings is still in progress or pending.
    #[error("the previous innings has not completed")]
    PreviousInningsOpen,
    /// All scheduled innings have been played.
    #[error("all scheduled innings have been played")]
    NoInningsRemaining,
}

// ============================================================================
// SECTION: Transitions
// ============================================================================

/// Records the toss and moves the match to toss-pending.
///
/// # Errors
///
/// Returns [`LifecycleError`] when the stage, winner, or repetition rules
/// are violated.
pub fn conduct_toss(
    record: &mut MatchRecord,
    won_by: TeamId,
    elected: TossElection,
    conducted_at: Timestamp,
) -> Result<(), LifecycleError> {
    if !matches!(record.stage, MatchStage::Scheduled | MatchStage::TossPending) {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "conduct_toss",
        });
    }
    if record.toss.is_some() {
        return Err(LifecycleError::TossAlreadyConducted);
    }
    if won_by != record.team_a && won_by != record.team_b {
        return Err(LifecycleError::TossWinnerNotInMatch(won_by));
    }
    record.toss = Some(TossOutcome {
        won_by,
        elected,
        conducted_at,
    });
    record.stage = MatchStage::TossPending;
    Ok(())
}

/// Sets a team's playing XI, going live when both sides are set post-toss.
///
/// # Errors
///
/// Returns [`LifecycleError`] when the stage forbids changes or the XI is
/// structurally invalid.
pub fn set_playing_xi(
    record: &mut MatchRecord,
    team: TeamId,
    entries: Vec<PlayingXiEntry>,
) -> Result<(), LifecycleError> {
    if !matches!(record.stage, MatchStage::Scheduled | MatchStage::TossPending) {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "set_playing_xi",
        });
    }
    if team != record.team_a && team != record.team_b {
        return Err(LifecycleError::TeamNotInMatch(team));
    }
    validate_playing_xi(&entries, &record.rules)?;
    record.playing_xi.insert(team, entries);
    if record.stage == MatchStage::TossPending
        && record.playing_xi.contains_key(&record.team_a)
        && record.playing_xi.contains_key(&record.team_b)
    {
        record.stage = MatchStage::Live;
    }
    Ok(())
}

/// Moves a live match into the innings break after an innings terminates.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] when the match is not live.
pub fn enter_innings_break(record: &mut MatchRecord) -> Result<(), LifecycleError> {
    if record.stage != MatchStage::Live {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "enter_innings_break",
        });
    }
    record.stage = MatchStage::InningsBreak;
    Ok(())
}

/// Resumes a match from the innings break when the next innings opens.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] when the match is not in a
/// break.
pub fn resume_live(record: &mut MatchRecord) -> Result<(), LifecycleError> {
    if record.stage != MatchStage::InningsBreak {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "open_innings",
        });
    }
    record.stage = MatchStage::Live;
    Ok(())
}

/// Completes the match with a result once all innings have been played.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] when the match is neither
/// live nor in an innings break.
pub fn complete_match(
    record: &mut MatchRecord,
    result: MatchResult,
) -> Result<(), LifecycleError> {
    if !matches!(record.stage, MatchStage::Live | MatchStage::InningsBreak) {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "complete_match",
        });
    }
    record.stage = MatchStage::Completed;
    record.result = Some(result);
    Ok(())
}

/// Abandons the match from any stage short of completion.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] when the match has already
/// completed.
pub fn abandon_match(record: &mut MatchRecord) -> Result<(), LifecycleError> {
    if record.stage == MatchStage::Completed {
        return Err(LifecycleError::InvalidTransition {
            stage: record.stage,
            action: "abandon_match",
        });
    }
    record.stage = MatchStage::Abandoned;
    Ok(())
}

// ============================================================================
// SECTION: Result Computation
// ============================================================================

/// Computes the final result from the completed innings of a two-innings match.
///
/// The chasing side wins with wickets in hand when it passes the target; the
/// defending side wins by the run difference; level scores report a tie and
/// the rules' tie-break mode as metadata.
#[must_use]
pub fn compute_result(
    first: &InningsState,
    second: &InningsState,
    wickets_to_fall: u8,
) -> MatchResult {
    if let Some(target) = second.target {
        if second.total_runs > target {
            return MatchResult {
                winner: Some(second.batting_team),
                margin: WinMargin::Wickets {
                    wickets: wickets_to_fall.saturating_sub(second.wickets_fallen),
                },
            };
        }
    }
    if second.total_runs < first.total_runs {
        return MatchResult {
            winner: Some(first.batting_team),
            margin: WinMargin::Runs {
                runs: first.total_runs - second.total_runs,
            },
        };
    }
    if second.total_runs == first.total_runs {
        return MatchResult {
            winner: None,
            margin: WinMargin::Tie,
        };
    }
    // Equal-target edge: total exceeds the first innings score without a
    // recorded target. Treat as a chase win on wickets.
    MatchResult {
        winner: Some(second.batting_team),
        margin: WinMargin::Wickets {
            wickets: wickets_to_fall.saturating_sub(second.wickets_fallen),
        },
    }
}
