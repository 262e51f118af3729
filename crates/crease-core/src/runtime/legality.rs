// crates/crease-core/src/runtime/legality.rs
// ============================================================================
// Module: Delivery Legality
// Description: Pure cricket-legality validation for submitted deliveries.
// Purpose: Reject impossible submissions before they enter the event log.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Legality checks are pure functions over the submission, the derived
//! innings state, the playing sides, and the match rules. They never touch
//! storage and never panic; every rejection is a tagged
//! [`LegalityViolation`] the command boundary converts to an error response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ball::BoundaryKind;
use crate::core::ball::DismissalKind;
use crate::core::ball::ExtraKind;
use crate::core::ball::WicketDetail;
use crate::core::event::BallSubmission;
use crate::core::identifiers::PlayerId;
use crate::core::innings::InningsState;
use crate::core::rules::MatchRules;
use crate::core::team::PlayingXiEntry;
use crate::core::team::keeper_of;
use crate::core::team::side_contains;

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Cricket-legality violations for a submitted delivery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LegalityViolation {
    /// Striker and non-striker must be distinct players.
    #[error("striker and non-striker must be distinct")]
    StrikerEqualsNonStriker,
    /// The named batsman is not in the batting side.
    #[error("batsman {0} is not in the batting side")]
    BatsmanNotInBattingSide(PlayerId),
    /// The bowler is not in the bowling side.
    #[error("bowler {0} is not in the bowling side")]
    BowlerNotInBowlingSide(PlayerId),
    /// The bowler bowled the previous over and consecutive overs are barred.
    #[error("bowler {0} cannot bowl consecutive overs")]
    ConsecutiveOvers(PlayerId),
    /// The legality flag contradicts the extra classification.
    #[error("is_legal contradicts extra kind {0}")]
    LegalityFlagMismatch(ExtraKind),
    /// Runs off the bat are impossible for this extra classification.
    #[error("runs off the bat are impossible on a {0}")]
    BatRunsImpossible(ExtraKind),
    /// Extra runs were supplied for a plain delivery.
    #[error("extra runs require an extra kind")]
    ExtraRunsWithoutExtra,
    /// Bye and leg-bye deliveries record their runs off the bat field.
    #[error("bye and leg-bye runs are carried in runs_off_bat")]
    ByeCarriesExtraRuns,
    /// Boundary flag and boundary kind must be set together.
    #[error("boundary flag and boundary kind must agree")]
    BoundaryKindMismatch,
    /// Boundary runs must match the boundary kind.
    #[error("boundary runs must be 4 for a four and 6 for a six")]
    BoundaryRunsMismatch,
    /// A boundary cannot be credited on this extra classification.
    #[error("a batsman boundary is impossible on a {0}")]
    BoundaryImpossible(ExtraKind),
    /// Wicket flag and wicket detail must be set together.
    #[error("is_wicket and wicket detail must agree")]
    WicketDetailMismatch,
    /// The dismissal kind is impossible on this delivery.
    #[error("{kind} is impossible on a {extra}")]
    DismissalImpossible {
        /// Claimed dismissal kind.
        kind: DismissalKind,
        /// Extra classification of the delivery.
        extra: ExtraKind,
    },
    /// The dismissal credits a bowler but no credit was supplied.
    #[error("{0} requires a bowler credit")]
    BowlerCreditRequired(DismissalKind),
    /// The bowler credit must name the bowler of the delivery.
    #[error("bowler credit must name the delivery bowler")]
    BowlerCreditWrongBowler,
    /// The dismissal kind does not credit a bowler.
    #[error("{0} does not credit a bowler")]
    BowlerCreditForbidden(DismissalKind),
    /// A stumping requires a keeper in the bowling side.
    #[error("stumped requires a keeper in the bowling side")]
    KeeperRequired,
    /// The dismissed batsman must be at the crease.
    #[error("dismissed batsman {0} is not at the crease")]
    BatsmanOutNotAtCrease(PlayerId),
    /// Only run-out style dismissals can remove the non-striker.
    #[error("{0} can only dismiss the striker")]
    NonStrikerDismissalImpossible(DismissalKind),
}

// ============================================================================
// SECTION: Legality Check
// ============================================================================

/// Validates a submitted delivery against cricket legality.
///
/// The check is keyed on the active match rules and the derived innings
/// state; it assumes the innings is open (the engine enforces lifecycle
/// preconditions separately).
///
/// # Errors
///
/// Returns the first [`LegalityViolation`] found.
pub fn check_legality(
    submission: &BallSubmission,
    innings: &InningsState,
    batting_side: &[PlayingXiEntry],
    bowling_side: &[PlayingXiEntry],
    rules: &MatchRules,
) -> Result<(), LegalityViolation> {
    check_participants(submission, innings, batting_side, bowling_side, rules)?;
    check_outcome_shape(submission)?;
    if let Some(wicket) = &submission.outcome.wicket {
        check_wicket(submission, wicket, bowling_side)?;
    }
    Ok(())
}

/// Validates striker, non-striker, and bowler membership and ordering rules.
fn check_participants(
    submission: &BallSubmission,
    innings: &InningsState,
    batting_side: &[PlayingXiEntry],
    bowling_side: &[PlayingXiEntry],
    rules: &MatchRules,
) -> Result<(), LegalityViolation> {
    if let Some(non_striker) = submission.non_striker {
        if non_striker == submission.striker {
            return Err(LegalityViolation::StrikerEqualsNonStriker);
        }
        if !side_contains(batting_side, non_striker) {
            return Err(LegalityViolation::BatsmanNotInBattingSide(non_striker));
        }
    }
    if !side_contains(batting_side, submission.striker) {
        return Err(LegalityViolation::BatsmanNotInBattingSide(submission.striker));
    }
    if !side_contains(bowling_side, submission.bowler) {
        return Err(LegalityViolation::BowlerNotInBowlingSide(submission.bowler));
    }
    if !rules.allow_same_bowler_consecutive
        && innings.ball_in_over == 0
        && innings.previous_bowler == Some(submission.bowler)
    {
        return Err(LegalityViolation::ConsecutiveOvers(submission.bowler));
    }
    Ok(())
}

/// Validates internal consistency of the claimed outcome.
fn check_outcome_shape(submission: &BallSubmission) -> Result<(), LegalityViolation> {
    let outcome = &submission.outcome;
    if outcome.is_legal != outcome.extra_kind.counts_as_legal() {
        return Err(LegalityViolation::LegalityFlagMismatch(outcome.extra_kind));
    }
    match outcome.extra_kind {
        ExtraKind::None => {
            if outcome.extra_runs != 0 {
                return Err(LegalityViolation::ExtraRunsWithoutExtra);
            }
        }
        ExtraKind::Wide | ExtraKind::Penalty => {
            if outcome.runs_off_bat != 0 {
                return Err(LegalityViolation::BatRunsImpossible(outcome.extra_kind));
            }
        }
        ExtraKind::Bye | ExtraKind::LegBye => {
            if outcome.extra_runs != 0 {
                return Err(LegalityViolation::ByeCarriesExtraRuns);
            }
        }
        ExtraKind::NoBall => {}
    }
    match (outcome.is_boundary, outcome.boundary_kind) {
        (true, Some(kind)) => {
            if !matches!(outcome.extra_kind, ExtraKind::None | ExtraKind::NoBall) {
                return Err(LegalityViolation::BoundaryImpossible(outcome.extra_kind));
            }
            let expected = match kind {
                BoundaryKind::Four => 4,
                BoundaryKind::Six => 6,
            };
            if outcome.runs_off_bat != expected {
                return Err(LegalityViolation::BoundaryRunsMismatch);
            }
        }
        (false, None) => {}
        _ => return Err(LegalityViolation::BoundaryKindMismatch),
    }
    if outcome.is_wicket != outcome.wicket.is_some() {
        return Err(LegalityViolation::WicketDetailMismatch);
    }
    Ok(())
}

/// Validates dismissal compatibility with the delivery and the fielding side.
fn check_wicket(
    submission: &BallSubmission,
    wicket: &WicketDetail,
    bowling_side: &[PlayingXiEntry],
) -> Result<(), LegalityViolation> {
    let extra = submission.outcome.extra_kind;
    if !dismissal_possible_on(wicket.dismissal, extra) {
        return Err(LegalityViolation::DismissalImpossible {
            kind: wicket.dismissal,
            extra,
        });
    }
    if wicket.dismissal.credits_bowler() {
        match wicket.bowler_credit {
            None => return Err(LegalityViolation::BowlerCreditRequired(wicket.dismissal)),
            Some(credited) if credited != submission.bowler => {
                return Err(LegalityViolation::BowlerCreditWrongBowler);
            }
            Some(_) => {}
        }
    } else if wicket.bowler_credit.is_some() {
        return Err(LegalityViolation::BowlerCreditForbidden(wicket.dismissal));
    }
    if wicket.dismissal.requires_keeper() && keeper_of(bowling_side).is_none() {
        return Err(LegalityViolation::KeeperRequired);
    }
    let at_crease = wicket.batsman_out == submission.striker
        || submission.non_striker == Some(wicket.batsman_out);
    if !at_crease {
        return Err(LegalityViolation::BatsmanOutNotAtCrease(wicket.batsman_out));
    }
    if wicket.batsman_out != submission.striker && !dismisses_either_end(wicket.dismissal) {
        return Err(LegalityViolation::NonStrikerDismissalImpossible(wicket.dismissal));
    }
    Ok(())
}

/// Returns true when the dismissal kind is possible on the given extra.
const fn dismissal_possible_on(kind: DismissalKind, extra: ExtraKind) -> bool {
    match extra {
        ExtraKind::None | ExtraKind::Bye | ExtraKind::LegBye => true,
        // Off a wide the ball cannot be played; only these stand.
        ExtraKind::Wide => matches!(
            kind,
            DismissalKind::Stumped
                | DismissalKind::RunOut
                | DismissalKind::HitWicket
                | DismissalKind::ObstructingField
        ),
        // A no-ball cancels bowler-credited dismissals except run-out style.
        ExtraKind::NoBall => matches!(
            kind,
            DismissalKind::RunOut | DismissalKind::ObstructingField | DismissalKind::RetiredOut
        ),
        ExtraKind::Penalty => matches!(kind, DismissalKind::RunOut | DismissalKind::ObstructingField),
    }
}

/// Returns true when the dismissal kind can remove the non-striker.
const fn dismisses_either_end(kind: DismissalKind) -> bool {
    matches!(
        kind,
        DismissalKind::RunOut
            | DismissalKind::ObstructingField
            | DismissalKind::RetiredOut
            | DismissalKind::TimedOut
    )
}
