// crates/crease-core/tests/lifecycle.rs
// ============================================================================
// Module: Lifecycle Tests
// Description: Tests for the match stage machine and result computation.
// ============================================================================
//! ## Overview
//! Exercises the fixed transition DAG: toss ordering, go-live on both XIs,
//! freeze after go-live, abandonment, and the win-margin arithmetic.

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

use std::collections::BTreeMap;

use crease_core::InningsId;
use crease_core::InningsState;
use crease_core::LifecycleError;
use crease_core::MatchId;
use crease_core::MatchRecord;
use crease_core::MatchRules;
use crease_core::MatchStage;
use crease_core::PlayerId;
use crease_core::PlayingXiEntry;
use crease_core::TeamId;
use crease_core::Timestamp;
use crease_core::TossElection;
use crease_core::UserId;
use crease_core::WinMargin;
use crease_core::runtime::compute_result;
use crease_core::runtime::lifecycle::abandon_match;
use crease_core::runtime::lifecycle::conduct_toss;
use crease_core::runtime::lifecycle::set_playing_xi;

/// Builds a scheduled match record.
fn record() -> MatchRecord {
    MatchRecord {
        match_id: MatchId::generate(),
        team_a: TeamId::generate(),
        team_b: TeamId::generate(),
        rules: MatchRules::t20(),
        toss: None,
        stage: MatchStage::Scheduled,
        created_by: UserId::generate(),
        playing_xi: BTreeMap::new(),
        officials: Vec::new(),
        result: None,
        created_at: Timestamp::from_unix_millis_saturating(0),
    }
}

/// Builds a valid eleven.
fn eleven() -> Vec<PlayingXiEntry> {
    (0..11u8)
        .map(|index| PlayingXiEntry {
            player_id: PlayerId::generate(),
            can_bat: true,
            can_bowl: true,
            is_keeper: index == 1,
            is_captain: index == 0,
            batting_order: index + 1,
        })
        .collect()
}

/// Innings state helper for result computation.
fn innings_with(batting: TeamId, runs: u32, wickets: u8, target: Option<u32>) -> InningsState {
    let mut state = InningsState::open(
        InningsId::generate(),
        MatchId::generate(),
        1,
        batting,
        TeamId::generate(),
        target,
    );
    state.total_runs = runs;
    state.wickets_fallen = wickets;
    state
}

// ============================================================================
// SECTION: Transitions
// ============================================================================

/// The toss moves a scheduled match to toss-pending exactly once.
#[test]
fn toss_moves_to_toss_pending_once() {
    let mut match_record = record();
    let winner = match_record.team_a;
    let at = Timestamp::from_unix_millis_saturating(1);
    conduct_toss(&mut match_record, winner, TossElection::Bat, at).unwrap();
    assert_eq!(match_record.stage, MatchStage::TossPending);

    let repeat = conduct_toss(&mut match_record, winner, TossElection::Bowl, at);
    assert_eq!(repeat, Err(LifecycleError::TossAlreadyConducted));
}

/// The toss winner must be a party to the match.
#[test]
fn toss_winner_must_play_in_the_match() {
    let mut match_record = record();
    let outsider = TeamId::generate();
    let at = Timestamp::from_unix_millis_saturating(1);
    assert_eq!(
        conduct_toss(&mut match_record, outsider, TossElection::Bat, at),
        Err(LifecycleError::TossWinnerNotInMatch(outsider))
    );
}

/// Both XIs after the toss take the match live; XIs freeze afterwards.
#[test]
fn both_sides_set_after_the_toss_goes_live() {
    let mut match_record = record();
    let at = Timestamp::from_unix_millis_saturating(1);
    let team_a = match_record.team_a;
    let team_b = match_record.team_b;

    set_playing_xi(&mut match_record, team_a, eleven()).unwrap();
    assert_eq!(match_record.stage, MatchStage::Scheduled);

    conduct_toss(&mut match_record, team_a, TossElection::Bat, at).unwrap();
    set_playing_xi(&mut match_record, team_b, eleven()).unwrap();
    assert_eq!(match_record.stage, MatchStage::Live);

    let frozen = set_playing_xi(&mut match_record, team_a, eleven());
    assert!(matches!(frozen, Err(LifecycleError::InvalidTransition { .. })));
}

/// A wrong-sized XI is rejected before any stage change.
#[test]
fn undersized_xi_is_rejected() {
    let mut match_record = record();
    let team_a = match_record.team_a;
    let mut short = eleven();
    short.truncate(10);
    assert!(matches!(
        set_playing_xi(&mut match_record, team_a, short),
        Err(LifecycleError::PlayingXi(_))
    ));
}

/// Any stage short of completion can abandon; completed cannot.
#[test]
fn abandon_is_barred_only_after_completion() {
    let mut match_record = record();
    abandon_match(&mut match_record).unwrap();
    assert_eq!(match_record.stage, MatchStage::Abandoned);

    let mut completed = record();
    completed.stage = MatchStage::Completed;
    assert!(matches!(
        abandon_match(&mut completed),
        Err(LifecycleError::InvalidTransition { .. })
    ));
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// The chasing side wins with wickets in hand.
#[test]
fn chase_win_reports_wickets_in_hand() {
    let defending = TeamId::generate();
    let chasing = TeamId::generate();
    let first = innings_with(defending, 181, 7, None);
    let second = innings_with(chasing, 182, 6, Some(181));
    let result = compute_result(&first, &second, 10);
    assert_eq!(result.winner, Some(chasing));
    assert_eq!(
        result.margin,
        WinMargin::Wickets {
            wickets: 4
        }
    );
}

/// The defending side wins by the run difference.
#[test]
fn defended_total_reports_runs() {
    let defending = TeamId::generate();
    let chasing = TeamId::generate();
    let first = innings_with(defending, 181, 7, None);
    let second = innings_with(chasing, 150, 10, Some(181));
    let result = compute_result(&first, &second, 10);
    assert_eq!(result.winner, Some(defending));
    assert_eq!(
        result.margin,
        WinMargin::Runs {
            runs: 31
        }
    );
}

/// Level scores report a tie with no winner.
#[test]
fn level_scores_report_a_tie() {
    let defending = TeamId::generate();
    let chasing = TeamId::generate();
    let first = innings_with(defending, 160, 5, None);
    let second = innings_with(chasing, 160, 8, Some(160));
    let result = compute_result(&first, &second, 10);
    assert_eq!(result.winner, None);
    assert_eq!(result.margin, WinMargin::Tie);
}
