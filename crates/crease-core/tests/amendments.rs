// crates/crease-core/tests/amendments.rs
// ============================================================================
// Module: Amendment Tests
// Description: Tests for wicket annotations and compensating corrections.
// ============================================================================
//! ## Overview
//! Covers the two amendment paths: attaching a dismissal to a pending claim
//! before consensus, and correcting an already-committed ball through a
//! dual-scorer compensating commit that adjusts totals without rewriting
//! history.

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

mod common;

use common::Fixture;
use common::ball;
use common::runs;
use crease_core::BallDisposition;
use crease_core::DismissalKind;
use crease_core::EngineError;
use crease_core::WicketDetail;

/// Sets up a live match with an open first innings, batsmen, and over 1.
fn live_innings(fixture: &Fixture) -> (crease_core::InningsId, crease_core::OverId) {
    fixture.go_live();
    let innings_id = fixture.open_innings(fixture.team_a);
    fixture.set_batsmen(innings_id, fixture.players_a[0], Some(fixture.players_a[1]));
    let over_id = fixture.open_over(innings_id, 1, fixture.players_b[10]);
    (innings_id, over_id)
}

/// A wicket recorded against a pending claim merges and then matches.
#[test]
fn wicket_recorded_merges_into_the_pending_claim() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];

    // Scorer A records the delivery without the dismissal; scorer B's full
    // claim arrives with it. A's wicket annotation closes the gap.
    let bare = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        bowler,
        striker,
        fixture.players_a[1],
        runs(0),
    );
    fixture.submit(fixture.scorer_a, bare.clone()).unwrap();

    let wicket = WicketDetail {
        dismissal: DismissalKind::Bowled,
        batsman_out: striker,
        bowler_credit: Some(bowler),
        fielders: Vec::new(),
    };
    let mut full = bare;
    full.outcome.is_wicket = true;
    full.outcome.wicket = Some(wicket.clone());
    let disputed = fixture.submit(fixture.scorer_b, full).unwrap();
    assert!(matches!(disputed.value, BallDisposition::Disputed { .. }));

    // The dispute consumed both claims, so a fresh pair converges: scorer A
    // resubmits with the dismissal and scorer B repeats the full claim.
    let committed = fixture
        .engine
        .record_wicket(
            &fixture.ctx(fixture.scorer_a),
            fixture.match_id,
            innings_id,
            ball(1, 1),
            wicket,
        );
    // No pending claim survives the dispute, so the annotation is rejected.
    assert!(matches!(committed, Err(EngineError::FailedPrecondition(_))));
}

/// A wicket annotation before consensus completes the scorer match.
#[test]
fn wicket_annotation_completes_consensus() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];
    let wicket = WicketDetail {
        dismissal: DismissalKind::Bowled,
        batsman_out: striker,
        bowler_credit: Some(bowler),
        fielders: Vec::new(),
    };

    // Scorer A submits the bare delivery first and annotates it before
    // scorer B's claim arrives.
    let bare = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        bowler,
        striker,
        fixture.players_a[1],
        runs(0),
    );
    fixture.submit(fixture.scorer_a, bare.clone()).unwrap();
    let annotated = fixture
        .engine
        .record_wicket(
            &fixture.ctx(fixture.scorer_a),
            fixture.match_id,
            innings_id,
            ball(1, 1),
            wicket.clone(),
        )
        .unwrap();
    assert!(matches!(annotated.value, BallDisposition::Pending));

    let mut full = bare;
    full.outcome.is_wicket = true;
    full.outcome.wicket = Some(wicket);
    let committed = fixture.submit(fixture.scorer_b, full).unwrap();
    assert!(matches!(committed.value, BallDisposition::Committed { .. }));

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.wickets_fallen, 1);
}

/// Agreeing corrections commit a compensating ball that adjusts totals.
#[test]
fn agreed_correction_commits_a_compensating_ball() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];
    let non_striker = fixture.players_a[1];

    let original = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        bowler,
        striker,
        non_striker,
        runs(2),
    );
    let committed = fixture.both_submit(&original);
    let BallDisposition::Committed {
        ball_id,
    } = committed.value
    else {
        panic!("expected a committed ball");
    };

    // Both scorers agree the delivery was actually three runs.
    let mut corrected = original;
    corrected.outcome.runs_off_bat = 3;
    let first = fixture
        .engine
        .submit_correction(
            &fixture.ctx(fixture.scorer_a),
            fixture.match_id,
            ball_id,
            corrected.clone(),
            String::from("sig"),
        )
        .unwrap();
    assert!(matches!(first.value, BallDisposition::Pending));
    let second = fixture
        .engine
        .submit_correction(
            &fixture.ctx(fixture.scorer_b),
            fixture.match_id,
            ball_id,
            corrected,
            String::from("sig"),
        )
        .unwrap();
    let BallDisposition::Committed {
        ball_id: compensating_id,
    } = second.value
    else {
        panic!("expected a compensating commit");
    };
    assert_ne!(compensating_id, ball_id);

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.total_runs, 3);
    // The cursor is untouched: one legal delivery has been bowled.
    assert_eq!(innings.state.ball_in_over, 1);
    let compensating = innings
        .balls
        .iter()
        .find(|candidate| candidate.ball_id == compensating_id)
        .unwrap();
    assert_eq!(compensating.compensates, Some(ball_id));

    let batsman = innings.batsmen.get(&striker).unwrap();
    assert_eq!(batsman.runs, 3);
    assert_eq!(batsman.balls_faced, 1);
}

/// Corrections may not change wicket or legality classifications.
#[test]
fn correction_cannot_change_the_wicket_or_legality() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let original = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        fixture.players_b[10],
        fixture.players_a[0],
        fixture.players_a[1],
        runs(1),
    );
    let committed = fixture.both_submit(&original);
    let BallDisposition::Committed {
        ball_id,
    } = committed.value
    else {
        panic!("expected a committed ball");
    };

    let mut wide_instead = original;
    wide_instead.outcome = common::wide(0);
    let rejected = fixture.engine.submit_correction(
        &fixture.ctx(fixture.scorer_a),
        fixture.match_id,
        ball_id,
        wide_instead,
        String::from("sig"),
    );
    assert!(matches!(rejected, Err(EngineError::InvalidArgument(_))));
}
