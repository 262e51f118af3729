// crates/crease-core/tests/scenarios.rs
// ============================================================================
// Module: End-to-End Scoring Scenarios
// Description: Full-match engine scenarios with dual-scorer consensus.
// Purpose: Validate over, wicket, dispute, chase, and tamper flows end to end.
// Dependencies: crease-core
// ============================================================================
//! ## Overview
//! Drives the engine through complete scoring passages with both scorers
//! submitting every ball: a clean over, a maiden, a wide followed by a
//! wicket, a disagreement with held commits and reconciliation, a chase
//! finish, duplicate-submission idempotence, replay determinism, and hash
//! chain tamper detection.

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
use common::caught;
use common::runs;
use common::wide;
use crease_core::BallDisposition;
use crease_core::EngineError;
use crease_core::EngineEvent;
use crease_core::EventStore;
use crease_core::InningsEndReason;
use crease_core::MatchStage;
use crease_core::WinMargin;

/// Sets up a live match with an open first innings, batsmen, and over 1.
fn live_innings(fixture: &Fixture) -> (crease_core::InningsId, crease_core::OverId) {
    fixture.go_live();
    let innings_id = fixture.open_innings(fixture.team_a);
    fixture.set_batsmen(innings_id, fixture.players_a[0], Some(fixture.players_a[1]));
    let over_id = fixture.open_over(innings_id, 1, fixture.players_b[10]);
    (innings_id, over_id)
}

/// Scenario: both scorers agree on a six-ball over of 0, 1, 4, 0, 2, 1.
#[test]
fn clean_over_commits_six_balls_and_completes_the_over() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];

    let mut ball_events = 0;
    let mut over_events = 0;
    for (index, outcome_runs) in [0u32, 1, 4, 0, 2, 1].into_iter().enumerate() {
        let number = ball(1, u8::try_from(index + 1).unwrap());
        let submission = fixture.submission(
            innings_id,
            over_id,
            number,
            bowler,
            fixture.players_a[0],
            fixture.players_a[1],
            runs(outcome_runs),
        );
        let committed = fixture.both_submit(&submission);
        assert!(matches!(committed.value, BallDisposition::Committed { .. }));
        for event in &committed.events {
            match event {
                EngineEvent::BallCommitted { .. } => ball_events += 1,
                EngineEvent::OverCompleted { .. } => over_events += 1,
                _ => {}
            }
        }
    }
    assert_eq!(ball_events, 6);
    assert_eq!(over_events, 1);

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.total_runs, 8);
    assert_eq!(innings.state.wickets_fallen, 0);
    let over = innings.overs.get(&1).unwrap();
    assert_eq!(over.legal_deliveries, 6);
    assert!(!over.maiden);
    assert!(over.completed);
    assert_eq!(over.symbols, vec!["0", "1", "4", "0", "2", "1"]);

    // Rotation leaves the batsman now on strike having faced three or four.
    let striker = innings.state.striker.unwrap();
    let line = innings.batsmen.get(&striker).unwrap();
    assert!(line.balls_faced == 3 || line.balls_faced == 4);
}

/// Scenario: six dots make a maiden and a zero economy.
#[test]
fn maiden_over_is_decided_at_completion() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];

    for index in 1..=6u8 {
        let submission = fixture.submission(
            innings_id,
            over_id,
            ball(1, index),
            bowler,
            fixture.players_a[0],
            fixture.players_a[1],
            runs(0),
        );
        fixture.both_submit(&submission);
        // Mid-over zero-run state must never read as a maiden.
        if index < 6 {
            let state = fixture.state();
            let over =
                state.projection.innings_by_id(innings_id).unwrap().overs.get(&1).unwrap().clone();
            assert!(!over.maiden);
        }
    }

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    let over = innings.overs.get(&1).unwrap();
    assert!(over.maiden);
    assert!(over.completed);
    let line = innings.bowlers.get(&bowler).unwrap();
    assert_eq!(line.maidens, 1);
    assert!((line.economy().unwrap() - 0.0).abs() < f64::EPSILON);
}

/// Scenario: a wide at 1.3, then the re-bowled 1.3 takes a wicket.
#[test]
fn wide_then_wicket_keeps_the_coordinate_and_advances_after_the_legal_ball() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];
    let non_striker = fixture.players_a[1];

    for index in 1..=2u8 {
        let submission = fixture.submission(
            innings_id,
            over_id,
            ball(1, index),
            bowler,
            striker,
            non_striker,
            runs(0),
        );
        fixture.both_submit(&submission);
    }

    // The wide: one extra, no cursor advance.
    let the_wide =
        fixture.submission(innings_id, over_id, ball(1, 3), bowler, striker, non_striker, wide(0));
    fixture.both_submit(&the_wide);

    // The re-bowled delivery shares the coordinate with the wide.
    let the_wicket = fixture.submission(
        innings_id,
        over_id,
        ball(1, 3),
        bowler,
        striker,
        non_striker,
        caught(striker, bowler, fixture.players_b[1]),
    );
    let committed = fixture.both_submit(&the_wicket);
    assert!(matches!(committed.value, BallDisposition::Committed { .. }));
    assert!(
        committed.events.iter().any(|event| matches!(event, EngineEvent::WicketFallen { .. }))
    );

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.total_runs, 1);
    assert_eq!(innings.state.extras_total, 1);
    assert_eq!(innings.state.wickets_fallen, 1);
    assert_eq!(innings.state.ball_in_over, 3);
    assert_eq!(innings.fall_of_wickets.len(), 1);
    assert_eq!(innings.fall_of_wickets[0].batsman_out, striker);
    // Two canonical balls share the 1.3 coordinate: the wide and the wicket.
    let at_coordinate =
        innings.balls.iter().filter(|candidate| candidate.number == ball(1, 3)).count();
    assert_eq!(at_coordinate, 2);

    // Four raw ball events were logged for the coordinate: two per scorer.
    let raw = fixture.engine.store().read_range(fixture.match_id, 1, u64::MAX).unwrap();
    let recorded_at_coordinate = raw
        .iter()
        .filter(|event| {
            matches!(
                &event.payload,
                crease_core::EventPayload::BallRecorded {
                    submission,
                } if submission.number == ball(1, 3)
            )
        })
        .count();
    assert_eq!(recorded_at_coordinate, 4);
}

/// Scenario: scorers disagree, later balls are held, resolution reconciles.
#[test]
fn disagreement_opens_a_dispute_and_resolution_reconciles_in_order() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];
    let non_striker = fixture.players_a[1];

    let opening = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        bowler,
        striker,
        non_striker,
        runs(0),
    );
    fixture.both_submit(&opening);

    // Scorer A says four; scorer B says one.
    let says_four = fixture.submission(
        innings_id,
        over_id,
        ball(1, 2),
        bowler,
        striker,
        non_striker,
        runs(4),
    );
    let says_one = fixture.submission(
        innings_id,
        over_id,
        ball(1, 2),
        bowler,
        striker,
        non_striker,
        runs(1),
    );
    fixture.submit(fixture.scorer_a, says_four.clone()).unwrap();
    let disputed = fixture.submit(fixture.scorer_b, says_one).unwrap();
    let BallDisposition::Disputed {
        dispute_id,
    } = disputed.value
    else {
        panic!("expected a dispute, got {:?}", disputed.value);
    };
    assert!(
        disputed.events.iter().any(|event| matches!(event, EngineEvent::DisputeRaised { .. }))
    );

    // No canonical commit happened for 1.2.
    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.total_runs, 0);
    assert_eq!(innings.state.ball_in_over, 1);

    // Both scorers agree on 1.3; the commit is held behind the dispute.
    let next_ball = fixture.submission(
        innings_id,
        over_id,
        ball(1, 3),
        bowler,
        striker,
        non_striker,
        runs(1),
    );
    let held = fixture.both_submit(&next_ball);
    assert!(matches!(held.value, BallDisposition::Held { .. }));
    assert!(held.events.iter().any(|event| matches!(event, EngineEvent::BallHeld { .. })));

    // The official settles 1.2 as four; both balls reconcile in order.
    let resolved = fixture
        .engine
        .resolve_dispute(&fixture.ctx(fixture.official), fixture.match_id, dispute_id, runs(4))
        .unwrap();
    let mut saw_resolution = false;
    let mut reconciled: Vec<crease_core::BallNumber> = Vec::new();
    for event in &resolved.events {
        match event {
            EngineEvent::DisputeResolved { .. } => saw_resolution = true,
            EngineEvent::Reconciliation {
                balls, ..
            } => {
                assert!(saw_resolution, "reconciliation must follow the resolution");
                reconciled = balls.iter().map(|candidate| candidate.number).collect();
            }
            _ => {}
        }
    }
    assert_eq!(reconciled, vec![ball(1, 2), ball(1, 3)]);

    let state = fixture.state();
    let innings = state.projection.innings_by_id(innings_id).unwrap();
    assert_eq!(innings.state.total_runs, 5);
    assert_eq!(innings.state.ball_in_over, 3);
    assert!(state.consensus.held.is_empty());
}

/// Scenario: the chase completes on the ball that passes the target.
#[test]
fn chase_finish_completes_the_innings_and_the_match() {
    let fixture = Fixture::new();
    fixture.go_live();

    // First innings: 181 all told across twenty overs.
    let first = fixture.open_innings(fixture.team_a);
    fixture.set_batsmen(first, fixture.players_a[0], Some(fixture.players_a[1]));
    let mut first_total = 0u32;
    for over_number in 1..=20u32 {
        let bowler = fixture.players_b[10 - usize::try_from(over_number % 2).unwrap()];
        let over_id = fixture.open_over(first, over_number, bowler);
        let line: [u32; 6] = if over_number == 20 { [2, 1, 1, 1, 1, 4] } else { [1, 1, 1, 1, 1, 4] };
        for (index, scored) in line.into_iter().enumerate() {
            let submission = fixture.submission(
                first,
                over_id,
                ball(over_number, u8::try_from(index + 1).unwrap()),
                bowler,
                fixture.players_a[0],
                fixture.players_a[1],
                runs(scored),
            );
            fixture.both_submit(&submission);
            first_total += scored;
        }
    }
    assert_eq!(first_total, 181);
    let state = fixture.state();
    let first_innings = state.projection.innings_by_id(first).unwrap();
    assert!(first_innings.state.completed);
    assert_eq!(first_innings.state.end_reason, Some(InningsEndReason::OversExhausted));
    assert_eq!(state.record.stage, MatchStage::InningsBreak);

    // Second innings chases 181: six early wickets, then steady scoring.
    let second = fixture.open_innings(fixture.team_b);
    let state = fixture.state();
    assert_eq!(state.projection.innings_by_id(second).unwrap().state.target, Some(181));

    let mut next_batsman = 2usize;
    fixture.set_batsmen(second, fixture.players_b[0], Some(fixture.players_b[1]));
    for over_number in 1..=19u32 {
        let bowler = fixture.players_a[10 - usize::try_from(over_number % 2).unwrap()];
        let over_id = fixture.open_over(second, over_number, bowler);
        for index in 1u8..=6 {
            let state = fixture.state();
            let innings = state.projection.innings_by_id(second).unwrap();
            let striker = innings.state.striker.unwrap();
            let non_striker = innings.state.non_striker.unwrap();
            let outcome = if over_number <= 6 && index == 1 {
                caught(striker, bowler, fixture.players_a[1])
            } else if index == 6 {
                runs(4)
            } else {
                runs(1)
            };
            let submission = fixture.submission(
                second,
                over_id,
                ball(over_number, index),
                bowler,
                striker,
                non_striker,
                outcome.clone(),
            );
            fixture.both_submit(&submission);
            if outcome.is_wicket {
                let replacement = fixture.players_b[next_batsman];
                next_batsman += 1;
                fixture.set_batsmen(second, replacement, None);
            }
        }
    }
    // Overs 1-6 score 8 with a wicket; overs 7-19 score 9: 48 + 117 = 165.
    let state = fixture.state();
    let innings = state.projection.innings_by_id(second).unwrap();
    assert_eq!(innings.state.total_runs, 165);
    assert_eq!(innings.state.wickets_fallen, 6);

    // Over 20: five singles and then... fifteen needed, so boundaries.
    let bowler = fixture.players_a[10];
    let over_id = fixture.open_over(second, 20, bowler);
    for (index, scored) in [4u32, 4, 4, 2, 1].into_iter().enumerate() {
        let state = fixture.state();
        let innings = state.projection.innings_by_id(second).unwrap();
        let striker = innings.state.striker.unwrap();
        let non_striker = innings.state.non_striker.unwrap();
        let submission = fixture.submission(
            second,
            over_id,
            ball(20, u8::try_from(index + 1).unwrap()),
            bowler,
            striker,
            non_striker,
            runs(scored),
        );
        fixture.both_submit(&submission);
    }
    let state = fixture.state();
    let innings = state.projection.innings_by_id(second).unwrap();
    assert_eq!(innings.state.total_runs, 180);
    assert!(!innings.state.completed);

    // The winning ball: two off the bat takes the total past the target.
    let striker = innings.state.striker.unwrap();
    let non_striker = innings.state.non_striker.unwrap();
    let winning = fixture.submission(
        second,
        over_id,
        ball(20, 6),
        bowler,
        striker,
        non_striker,
        runs(2),
    );
    let committed = fixture.both_submit(&winning);
    assert!(
        committed.events.iter().any(|event| matches!(
            event,
            EngineEvent::InningsCompleted {
                reason: InningsEndReason::TargetChased,
                ..
            }
        ))
    );
    assert!(
        committed.events.iter().any(|event| matches!(event, EngineEvent::MatchCompleted { .. }))
    );

    let state = fixture.state();
    let innings = state.projection.innings_by_id(second).unwrap();
    assert_eq!(innings.state.total_runs, 182);
    assert!(innings.state.completed);
    assert_eq!(state.record.stage, MatchStage::Completed);
    let result = state.record.result.unwrap();
    assert_eq!(result.winner, Some(fixture.team_b));
    assert_eq!(
        result.margin,
        WinMargin::Wickets {
            wickets: 4
        }
    );
}

/// A coordinate past the expected next ball is rejected as out of sequence.
#[test]
fn skipped_coordinate_is_rejected() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    let striker = fixture.players_a[0];
    let non_striker = fixture.players_a[1];

    // The very first delivery of the over cannot be recorded as 1.5.
    let skipped = fixture.submission(
        innings_id,
        over_id,
        ball(1, 5),
        bowler,
        striker,
        non_striker,
        runs(0),
    );
    let rejected = fixture.submit(fixture.scorer_a, skipped);
    assert!(matches!(rejected, Err(EngineError::FailedPrecondition(_))));

    // After 1.1 commits, 1.3 skips past the expected 1.2.
    let opening = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        bowler,
        striker,
        non_striker,
        runs(0),
    );
    fixture.both_submit(&opening);
    let skipped = fixture.submission(
        innings_id,
        over_id,
        ball(1, 3),
        bowler,
        striker,
        non_striker,
        runs(1),
    );
    let rejected = fixture.submit(fixture.scorer_a, skipped);
    assert!(matches!(rejected, Err(EngineError::FailedPrecondition(_))));

    // A rejection appends nothing to the log.
    let raw = fixture.engine.store().read_range(fixture.match_id, 1, u64::MAX).unwrap();
    let recorded = raw
        .iter()
        .filter(|event| {
            matches!(&event.payload, crease_core::EventPayload::BallRecorded { .. })
        })
        .count();
    assert_eq!(recorded, 2);

    // The expected coordinate still goes through.
    let next = fixture.submission(
        innings_id,
        over_id,
        ball(1, 2),
        bowler,
        striker,
        non_striker,
        runs(1),
    );
    let committed = fixture.both_submit(&next);
    assert!(matches!(committed.value, BallDisposition::Committed { .. }));
}

/// Identical resubmission yields one raw event and a conflict.
#[test]
fn duplicate_submission_returns_conflict_without_a_second_event() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let submission = fixture.submission(
        innings_id,
        over_id,
        ball(1, 1),
        fixture.players_b[10],
        fixture.players_a[0],
        fixture.players_a[1],
        runs(1),
    );
    fixture.submit(fixture.scorer_a, submission.clone()).unwrap();
    let before = fixture
        .engine
        .store()
        .read_range(fixture.match_id, 1, u64::MAX)
        .unwrap()
        .len();
    let duplicate = fixture.submit(fixture.scorer_a, submission);
    assert!(matches!(duplicate, Err(EngineError::Conflict(_))));
    let after = fixture
        .engine
        .store()
        .read_range(fixture.match_id, 1, u64::MAX)
        .unwrap()
        .len();
    assert_eq!(before, after);
}

/// Replaying the raw log reproduces the incremental projection exactly.
#[test]
fn replay_reproduces_the_projection() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    for (index, scored) in [0u32, 1, 4, 0, 2, 1].into_iter().enumerate() {
        let submission = fixture.submission(
            innings_id,
            over_id,
            ball(1, u8::try_from(index + 1).unwrap()),
            bowler,
            fixture.players_a[0],
            fixture.players_a[1],
            runs(scored),
        );
        fixture.both_submit(&submission);
    }
    let live = fixture.state();
    let replayed = fixture.engine.replay(fixture.match_id).unwrap();
    assert_eq!(live.projection, replayed.projection);
}

/// Tampering with a stored payload breaks the chain at that sequence.
#[test]
fn chain_tamper_is_detected_at_the_tampered_sequence() {
    let fixture = Fixture::new();
    let (innings_id, over_id) = live_innings(&fixture);
    let bowler = fixture.players_b[10];
    for (index, scored) in [0u32, 1, 4, 0, 2, 1].into_iter().enumerate() {
        let submission = fixture.submission(
            innings_id,
            over_id,
            ball(1, u8::try_from(index + 1).unwrap()),
            bowler,
            fixture.players_a[0],
            fixture.players_a[1],
            runs(scored),
        );
        fixture.both_submit(&submission);
    }
    let audit = fixture.engine.store().verify_chain(fixture.match_id).unwrap();
    assert!(audit.intact);

    // Rewrite the payload of the event at sequence 5 in storage.
    fixture
        .engine
        .store()
        .tamper_event(fixture.match_id, 5, |event| {
            event.signature = String::from("forged");
            if let crease_core::EventPayload::BallRecorded {
                submission,
            } = &mut event.payload
            {
                submission.outcome.runs_off_bat += 1;
            }
        })
        .unwrap();
    let audit = fixture.engine.store().verify_chain(fixture.match_id).unwrap();
    assert!(!audit.intact);
    assert_eq!(audit.first_break, Some(5));
}
