// crates/crease-core/tests/effect.rs
// ============================================================================
// Module: Delivery Effect Tests
// Description: Tests for the extras table, rotation, and termination rules.
// ============================================================================
//! ## Overview
//! Walks the extras table row by row, checks strike rotation for ran and
//! boundary runs, milestone crossings, and the innings termination
//! predicate for all four end reasons.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use crease_core::BallOutcome;
use crease_core::BoundaryKind;
use crease_core::ExtraKind;
use crease_core::InningsEndReason;
use crease_core::InningsId;
use crease_core::InningsState;
use crease_core::MatchId;
use crease_core::MatchRules;
use crease_core::PlayerId;
use crease_core::TeamId;
use crease_core::delivery_effect;
use crease_core::innings_terminates;
use crease_core::runtime::batting_milestones;
use crease_core::runtime::bowling_milestones;
use crease_core::runtime::Milestone;
use crease_core::projection::BatsmanAggregate;
use crease_core::projection::BowlerAggregate;
use crease_core::strike_swaps;

/// Outcome helper with the given extra classification.
fn outcome(runs_off_bat: u32, extra_kind: ExtraKind, extra_runs: u32) -> BallOutcome {
    BallOutcome {
        runs_off_bat,
        is_boundary: false,
        boundary_kind: None,
        is_legal: extra_kind.counts_as_legal(),
        extra_kind,
        extra_runs,
        is_wicket: false,
        wicket: None,
    }
}

/// Innings state helper with the given totals.
fn innings(total_runs: u32, wickets: u8, legal: u32, target: Option<u32>) -> InningsState {
    let mut state = InningsState::open(
        InningsId::generate(),
        MatchId::generate(),
        1,
        TeamId::generate(),
        TeamId::generate(),
        target,
    );
    state.total_runs = total_runs;
    state.wickets_fallen = wickets;
    state.legal_deliveries = legal;
    state
}

// ============================================================================
// SECTION: Extras Table
// ============================================================================

/// Plain deliveries credit the batsman and count as legal.
#[test]
fn plain_delivery_credits_the_batsman() {
    let effect = delivery_effect(&outcome(3, ExtraKind::None, 0));
    assert_eq!(effect.batsman_runs, 3);
    assert_eq!(effect.extras_runs, 0);
    assert!(effect.is_legal);
    assert!(effect.counts_ball_faced);
    assert!(effect.charges_bowler);
}

/// A wide adds one plus the additional runs to extras and is not legal.
#[test]
fn wide_adds_penalty_plus_additional_runs() {
    let effect = delivery_effect(&outcome(0, ExtraKind::Wide, 2));
    assert_eq!(effect.batsman_runs, 0);
    assert_eq!(effect.extras_runs, 3);
    assert!(!effect.is_legal);
    assert!(!effect.counts_ball_faced);
    assert!(effect.charges_bowler);
}

/// A no-ball keeps the off-bat portion with the batsman.
#[test]
fn no_ball_keeps_bat_runs_with_the_batsman() {
    let effect = delivery_effect(&outcome(4, ExtraKind::NoBall, 0));
    assert_eq!(effect.batsman_runs, 4);
    assert_eq!(effect.extras_runs, 1);
    assert!(!effect.is_legal);
}

/// Byes and leg byes move the ran runs to extras but count as legal.
#[test]
fn byes_and_leg_byes_are_legal_extras() {
    for kind in [ExtraKind::Bye, ExtraKind::LegBye] {
        let effect = delivery_effect(&outcome(2, kind, 0));
        assert_eq!(effect.batsman_runs, 0);
        assert_eq!(effect.extras_runs, 2);
        assert!(effect.is_legal);
        assert!(!effect.charges_bowler);
    }
}

/// Penalty runs are extras only and are not charged to the bowler.
#[test]
fn penalty_runs_are_uncharged_extras() {
    let effect = delivery_effect(&outcome(0, ExtraKind::Penalty, 5));
    assert_eq!(effect.batsman_runs, 0);
    assert_eq!(effect.extras_runs, 5);
    assert!(!effect.is_legal);
    assert!(!effect.charges_bowler);
}

// ============================================================================
// SECTION: Strike Rotation
// ============================================================================

/// Odd ran runs swap ends; even runs and boundaries do not.
#[test]
fn rotation_follows_ran_runs() {
    assert!(strike_swaps(&outcome(1, ExtraKind::None, 0)));
    assert!(strike_swaps(&outcome(3, ExtraKind::None, 0)));
    assert!(!strike_swaps(&outcome(2, ExtraKind::None, 0)));
    assert!(!strike_swaps(&outcome(0, ExtraKind::None, 0)));

    // A boundary four is not ran.
    let four = BallOutcome {
        runs_off_bat: 4,
        is_boundary: true,
        boundary_kind: Some(BoundaryKind::Four),
        ..outcome(4, ExtraKind::None, 0)
    };
    assert!(!strike_swaps(&four));

    // On a wide only the additional runs are ran.
    assert!(strike_swaps(&outcome(0, ExtraKind::Wide, 1)));
    assert!(!strike_swaps(&outcome(0, ExtraKind::Wide, 2)));

    // Byes are ran by the batsmen.
    assert!(strike_swaps(&outcome(1, ExtraKind::LegBye, 0)));
}

// ============================================================================
// SECTION: Milestones
// ============================================================================

/// Crossing fifty and a hundred fires one mark per multiple.
#[test]
fn batting_marks_fire_on_each_multiple() {
    let player = PlayerId::generate();
    let mut before = BatsmanAggregate::fresh(player);
    before.runs = 48;
    let mut after = before.clone();
    after.runs = 52;
    let milestones = batting_milestones(&before, &after);
    assert_eq!(milestones.len(), 1);
    assert!(matches!(
        milestones[0],
        Milestone::BatsmanRunsMark {
            mark: 50,
            ..
        }
    ));

    // A six from 98 crosses the hundred only.
    before.runs = 98;
    after.runs = 104;
    let milestones = batting_milestones(&before, &after);
    assert_eq!(milestones.len(), 1);
    assert!(matches!(
        milestones[0],
        Milestone::BatsmanRunsMark {
            mark: 100,
            ..
        }
    ));
}

/// Five wickets and three consecutive wicket balls fire bowling milestones.
#[test]
fn bowling_milestones_fire_on_thresholds() {
    let player = PlayerId::generate();
    let mut before = BowlerAggregate::fresh(player);
    before.wickets = 4;
    let mut after = before.clone();
    after.wickets = 5;
    let milestones = bowling_milestones(&before, &after);
    assert!(matches!(milestones[0], Milestone::BowlerFiveFor { .. }));

    before.wickets = 2;
    before.consecutive_wicket_balls = 2;
    after = before.clone();
    after.wickets = 3;
    after.consecutive_wicket_balls = 3;
    let milestones = bowling_milestones(&before, &after);
    assert!(milestones.iter().any(|entry| matches!(entry, Milestone::HatTrick { .. })));
}

// ============================================================================
// SECTION: Innings Termination
// ============================================================================

/// Each termination reason fires exactly at its threshold.
#[test]
fn termination_reasons_fire_at_their_thresholds() {
    let rules = MatchRules::t20();

    assert_eq!(innings_terminates(&innings(50, 9, 40, None), &rules), None);
    assert_eq!(
        innings_terminates(&innings(50, 10, 40, None), &rules),
        Some(InningsEndReason::AllOut)
    );
    assert_eq!(
        innings_terminates(&innings(50, 3, 120, None), &rules),
        Some(InningsEndReason::OversExhausted)
    );
    assert_eq!(innings_terminates(&innings(181, 3, 100, Some(181)), &rules), None);
    assert_eq!(
        innings_terminates(&innings(182, 3, 100, Some(181)), &rules),
        Some(InningsEndReason::TargetChased)
    );

    let mut declared = innings(90, 2, 60, None);
    declared.declared = true;
    assert_eq!(innings_terminates(&declared, &rules), Some(InningsEndReason::Declared));
}
