// crates/crease-core/src/runtime/projector.rs
// ============================================================================
// Module: State Projector
// Description: Folds canonical balls and administrative events into aggregates.
// Purpose: Maintain the deterministic derived view spectators and queries read.
// Dependencies: crate::core, crate::runtime::effect
// ============================================================================

//! ## Overview
//! The projector is the only writer of [`MatchProjection`]. `apply_ball` is
//! the incremental step used on every canonical commit; replaying the same
//! committed balls through it always reproduces the projection byte for
//! byte. Administrative appliers handle innings and over opening and batsman
//! or bowler assignment, which are logged events but not consensus subjects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ball::BoundaryKind;
use crate::core::ball::CanonicalBall;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::OverId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::TeamId;
use crate::core::innings::InningsEndReason;
use crate::core::innings::InningsState;
use crate::core::innings::OverState;
use crate::core::projection::BatsmanAggregate;
use crate::core::projection::BowlerAggregate;
use crate::core::projection::FallOfWicket;
use crate::core::projection::InningsProjection;
use crate::core::projection::MatchProjection;
use crate::core::rules::MatchRules;
use crate::runtime::effect::Milestone;
use crate::runtime::effect::batting_milestones;
use crate::runtime::effect::bowling_milestones;
use crate::runtime::effect::delivery_effect;
use crate::runtime::effect::innings_terminates;
use crate::runtime::effect::strike_swaps;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Projection failures indicating an engine-level precondition bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectorError {
    /// The referenced innings has not been opened.
    #[error("innings {0} is not open in the projection")]
    UnknownInnings(InningsId),
    /// The referenced over has not been opened.
    #[error("over {0} is not open in the projection")]
    UnknownOver(u32),
    /// The innings has already completed.
    #[error("innings {0} has completed")]
    InningsCompleted(InningsId),
    /// An innings with this identifier is already open.
    #[error("innings {0} is already open")]
    DuplicateInnings(InningsId),
    /// An over with this number is already open.
    #[error("over {0} already exists")]
    DuplicateOver(u32),
}

// ============================================================================
// SECTION: Apply Outcome
// ============================================================================

/// What one canonical commit changed, for broadcast assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct BallApplied {
    /// Whether the delivery completed its over.
    pub over_completed: bool,
    /// Innings termination reason, when this ball ended the innings.
    pub innings_ended: Option<InningsEndReason>,
    /// Milestones achieved on the delivery.
    pub milestones: Vec<Milestone>,
    /// Fall-of-wicket entry, when a wicket fell.
    pub fall_of_wicket: Option<FallOfWicket>,
}

// ============================================================================
// SECTION: Administrative Appliers
// ============================================================================

/// Opens a new innings in the projection.
///
/// # Errors
///
/// Returns [`ProjectorError::DuplicateInnings`] when the identifier is
/// already open.
pub fn open_innings(
    projection: &mut MatchProjection,
    match_id: MatchId,
    innings_id: InningsId,
    innings_number: u8,
    batting_team: TeamId,
    bowling_team: TeamId,
    target: Option<u32>,
) -> Result<(), ProjectorError> {
    if projection.innings.contains_key(&innings_id) {
        return Err(ProjectorError::DuplicateInnings(innings_id));
    }
    let state = InningsState::open(
        innings_id,
        match_id,
        innings_number,
        batting_team,
        bowling_team,
        target,
    );
    projection.innings.insert(innings_id, InningsProjection::open(state));
    projection.innings_order.push(innings_id);
    Ok(())
}

/// Opens a new over for an innings.
///
/// # Errors
///
/// Returns [`ProjectorError`] when the innings is unknown or completed, or
/// the over number is already open.
pub fn open_over(
    projection: &mut MatchProjection,
    innings_id: InningsId,
    over_id: OverId,
    over_number: u32,
    bowler: PlayerId,
) -> Result<(), ProjectorError> {
    let innings = projection
        .innings
        .get_mut(&innings_id)
        .ok_or(ProjectorError::UnknownInnings(innings_id))?;
    if innings.state.completed {
        return Err(ProjectorError::InningsCompleted(innings_id));
    }
    if innings.overs.contains_key(&over_number) {
        return Err(ProjectorError::DuplicateOver(over_number));
    }
    innings.overs.insert(over_number, OverState::open(over_id, innings_id, over_number, bowler));
    innings.state.current_bowler = Some(bowler);
    innings.bowlers.entry(bowler).or_insert_with(|| BowlerAggregate::fresh(bowler));
    Ok(())
}

/// Assigns the current batsmen.
///
/// An explicit assignment wins over any interim slot arrangement left by a
/// wicket or an end-of-over swap.
///
/// # Errors
///
/// Returns [`ProjectorError`] when the innings is unknown or completed.
pub fn set_batsmen(
    projection: &mut MatchProjection,
    innings_id: InningsId,
    striker: PlayerId,
    non_striker: Option<PlayerId>,
) -> Result<(), ProjectorError> {
    let innings = projection
        .innings
        .get_mut(&innings_id)
        .ok_or(ProjectorError::UnknownInnings(innings_id))?;
    if innings.state.completed {
        return Err(ProjectorError::InningsCompleted(innings_id));
    }
    innings.state.striker = Some(striker);
    innings.batsmen.entry(striker).or_insert_with(|| BatsmanAggregate::fresh(striker));
    if let Some(non_striker) = non_striker {
        innings.state.non_striker = Some(non_striker);
        innings
            .batsmen
            .entry(non_striker)
            .or_insert_with(|| BatsmanAggregate::fresh(non_striker));
    }
    Ok(())
}

/// Assigns the current bowler ahead of an over.
///
/// # Errors
///
/// Returns [`ProjectorError`] when the innings is unknown or completed.
pub fn set_bowler(
    projection: &mut MatchProjection,
    innings_id: InningsId,
    bowler: PlayerId,
) -> Result<(), ProjectorError> {
    let innings = projection
        .innings
        .get_mut(&innings_id)
        .ok_or(ProjectorError::UnknownInnings(innings_id))?;
    if innings.state.completed {
        return Err(ProjectorError::InningsCompleted(innings_id));
    }
    innings.state.current_bowler = Some(bowler);
    innings.bowlers.entry(bowler).or_insert_with(|| BowlerAggregate::fresh(bowler));
    Ok(())
}

/// Closes an innings by declaration or administrative action.
///
/// # Errors
///
/// Returns [`ProjectorError`] when the innings is unknown or completed.
pub fn close_innings(
    projection: &mut MatchProjection,
    innings_id: InningsId,
    declared: bool,
) -> Result<InningsEndReason, ProjectorError> {
    let innings = projection
        .innings
        .get_mut(&innings_id)
        .ok_or(ProjectorError::UnknownInnings(innings_id))?;
    if innings.state.completed {
        return Err(ProjectorError::InningsCompleted(innings_id));
    }
    let reason = if declared {
        InningsEndReason::Declared
    } else {
        InningsEndReason::OversExhausted
    };
    innings.state.declared = declared;
    complete_innings(innings, reason);
    Ok(reason)
}

// ============================================================================
// SECTION: Canonical Ball Application
// ============================================================================

/// Applies one canonical ball to the projection.
///
/// This is the incremental fold step: totals, cursor, over aggregates,
/// batsman and bowler aggregates, fall of wicket, strike rotation, over
/// completion, and innings termination, in that order.
///
/// # Errors
///
/// Returns [`ProjectorError`] when the owning innings or over is missing or
/// the innings already terminated; these indicate engine precondition bugs
/// rather than caller mistakes.
pub fn apply_ball(
    projection: &mut MatchProjection,
    ball: &CanonicalBall,
    rules: &MatchRules,
) -> Result<BallApplied, ProjectorError> {
    let innings = projection
        .innings
        .get_mut(&ball.innings_id)
        .ok_or(ProjectorError::UnknownInnings(ball.innings_id))?;
    if innings.state.completed {
        return Err(ProjectorError::InningsCompleted(ball.innings_id));
    }
    if !innings.overs.contains_key(&ball.number.over) {
        return Err(ProjectorError::UnknownOver(ball.number.over));
    }

    let effect = delivery_effect(&ball.outcome);

    // Innings totals and cursor.
    innings.state.total_runs += effect.total_runs();
    innings.state.extras_total += effect.extras_runs;
    if effect.is_legal {
        innings.state.ball_in_over += 1;
        innings.state.legal_deliveries += 1;
    }

    // Over aggregates.
    let over_completed = {
        let over = innings
            .overs
            .get_mut(&ball.number.over)
            .ok_or(ProjectorError::UnknownOver(ball.number.over))?;
        over.runs_conceded += effect.total_runs();
        over.extras_in_over += effect.extras_runs;
        if effect.is_legal {
            over.legal_deliveries += 1;
        }
        if ball.outcome.is_wicket {
            over.wickets_taken += 1;
        }
        over.symbols.push(ball.outcome.symbol());
        over.legal_deliveries >= rules.balls_per_over
    };

    // Batting aggregate for the striker.
    let batting_before = innings
        .batsmen
        .entry(ball.striker)
        .or_insert_with(|| BatsmanAggregate::fresh(ball.striker))
        .clone();
    let mut milestones = Vec::new();
    {
        let batsman = innings
            .batsmen
            .get_mut(&ball.striker)
            .ok_or(ProjectorError::UnknownInnings(ball.innings_id))?;
        batsman.runs += effect.batsman_runs;
        if effect.counts_ball_faced {
            batsman.balls_faced += 1;
        }
        if ball.outcome.is_boundary && effect.batsman_runs > 0 {
            match ball.outcome.boundary_kind {
                Some(BoundaryKind::Four) => batsman.fours += 1,
                Some(BoundaryKind::Six) => batsman.sixes += 1,
                None => {}
            }
        }
        milestones.extend(batting_milestones(&batting_before, batsman));
    }

    // Bowling aggregate.
    let bowling_before = innings
        .bowlers
        .entry(ball.bowler)
        .or_insert_with(|| BowlerAggregate::fresh(ball.bowler))
        .clone();
    let credited_wicket = ball
        .outcome
        .wicket
        .as_ref()
        .is_some_and(|wicket| wicket.dismissal.credits_bowler());
    {
        let bowler = innings
            .bowlers
            .get_mut(&ball.bowler)
            .ok_or(ProjectorError::UnknownInnings(ball.innings_id))?;
        if effect.is_legal {
            bowler.balls_bowled += 1;
        }
        if effect.charges_bowler {
            bowler.runs_conceded += effect.total_runs();
        }
        if credited_wicket {
            bowler.wickets += 1;
        }
        if effect.is_legal {
            if credited_wicket {
                bowler.consecutive_wicket_balls += 1;
            } else {
                bowler.consecutive_wicket_balls = 0;
            }
        }
        milestones.extend(bowling_milestones(&bowling_before, bowler));
    }

    // Fall of wicket.
    let mut fall_of_wicket = None;
    if let Some(wicket_record) = &ball.wicket {
        innings.state.wickets_fallen += 1;
        let entry = FallOfWicket {
            wicket_number: wicket_record.wicket_number,
            score: innings.state.total_runs,
            number: ball.number,
            batsman_out: wicket_record.detail.batsman_out,
            partnership_runs: innings.state.total_runs - innings.score_at_last_wicket,
        };
        innings.score_at_last_wicket = innings.state.total_runs;
        innings.fall_of_wickets.push(entry.clone());
        fall_of_wicket = Some(entry);
        if let Some(batsman) = innings.batsmen.get_mut(&wicket_record.detail.batsman_out) {
            batsman.out = Some(wicket_record.detail.dismissal);
        }
        // Vacate the dismissed batsman's slot; the incoming batsman is
        // placed by an explicit batsmen assignment.
        if innings.state.striker == Some(wicket_record.detail.batsman_out) {
            innings.state.striker = None;
        } else if innings.state.non_striker == Some(wicket_record.detail.batsman_out) {
            innings.state.non_striker = None;
        }
    }

    // Strike rotation from runs ran.
    if strike_swaps(&ball.outcome) {
        std::mem::swap(&mut innings.state.striker, &mut innings.state.non_striker);
    }

    // Over completion: maiden is decided only here, never mid-over.
    if over_completed {
        let bowler_id = {
            let over = innings
                .overs
                .get_mut(&ball.number.over)
                .ok_or(ProjectorError::UnknownOver(ball.number.over))?;
            over.completed = true;
            over.maiden = over.runs_conceded == 0;
            if over.maiden {
                if let Some(bowler) = innings.bowlers.get_mut(&over.bowler) {
                    bowler.maidens += 1;
                }
            }
            over.bowler
        };
        innings.state.current_over += 1;
        innings.state.ball_in_over = 0;
        innings.state.previous_bowler = Some(bowler_id);
        innings.state.current_bowler = None;
        std::mem::swap(&mut innings.state.striker, &mut innings.state.non_striker);
    }

    innings.balls.push(ball.clone());

    // Innings termination.
    let innings_ended = innings_terminates(&innings.state, rules);
    if let Some(reason) = innings_ended {
        complete_innings(innings, reason);
    }

    Ok(BallApplied {
        over_completed,
        innings_ended,
        milestones,
        fall_of_wicket,
    })
}

/// Marks an innings completed, closing the over in progress if any.
fn complete_innings(innings: &mut InningsProjection, reason: InningsEndReason) {
    innings.state.completed = true;
    innings.state.end_reason = Some(reason);
    innings.state.all_out = matches!(reason, InningsEndReason::AllOut);
    let current = innings.state.current_over;
    if let Some(over) = innings.overs.get_mut(&current) {
        if !over.completed {
            over.completed = true;
        }
    }
}

