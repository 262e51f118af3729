// crates/crease-core/tests/consensus.rs
// ============================================================================
// Module: Consensus Tests
// Description: Tests for claim matching, disputes, expiry, and held commits.
// ============================================================================
//! ## Overview
//! Drives the consensus decision rules directly: umpire override, scorer
//! match, disagreement classification, matching-window bounds, the
//! single-scorer expiry policy, and ordered release of held commits.

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

use crease_core::BallNumber;
use crease_core::BallOutcome;
use crease_core::ConsensusMethod;
use crease_core::ConsensusState;
use crease_core::DisputeKind;
use crease_core::EventId;
use crease_core::ExtraKind;
use crease_core::InningsId;
use crease_core::MatchId;
use crease_core::MatchingWindow;
use crease_core::PendingClaim;
use crease_core::ScorerSide;
use crease_core::Timestamp;
use crease_core::UserId;
use crease_core::runtime::ClaimDecision;
use crease_core::runtime::ClaimScope;
use crease_core::runtime::consensus::classify_disagreement;
use crease_core::runtime::consensus::consider_claim;
use crease_core::runtime::consensus::release_held;
use crease_core::runtime::consensus::sweep_expired;

/// Shared scope for one logical ball.
fn scope(match_id: MatchId, innings_id: InningsId, number: BallNumber) -> ClaimScope {
    ClaimScope {
        match_id,
        innings_id,
        number,
    }
}

/// Claim helper at a sequence and instant.
fn claim(
    innings_id: InningsId,
    scorer: UserId,
    side: ScorerSide,
    outcome: BallOutcome,
    sequence: u64,
    at_millis: i64,
) -> PendingClaim {
    PendingClaim {
        event_id: EventId::generate(),
        innings_id,
        scorer_id: scorer,
        scorer_side: side,
        outcome,
        shot_kind: None,
        fielding_position: None,
        sequence,
        recorded_at: Timestamp::from_unix_millis_saturating(i128::from(at_millis)),
    }
}

/// Outcome scoring the given runs off the bat.
fn outcome(runs: u32) -> BallOutcome {
    BallOutcome {
        runs_off_bat: runs,
        ..BallOutcome::dot()
    }
}

// ============================================================================
// SECTION: Decision Rules
// ============================================================================

/// Two agreeing opposite-side claims reach a scorer match at full confidence.
#[test]
fn agreeing_opposite_sides_reach_scorer_match() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(1, 1);
    let window = MatchingWindow::default();

    let first = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(2), 1, 0),
        window,
    );
    assert_eq!(first, ClaimDecision::Pending);

    let second = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Away, outcome(2), 2, 500),
        window,
    );
    let ClaimDecision::Reached(record) = second else {
        panic!("expected consensus, got {second:?}");
    };
    assert_eq!(record.method, ConsensusMethod::ScorerMatch);
    assert!((record.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(record.event_ids.len(), 2);
    assert!(state.pending.is_empty());
}

/// An umpire-side claim overrides immediately.
#[test]
fn umpire_claim_overrides() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(3, 4);
    let window = MatchingWindow::default();

    consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(1), 1, 0),
        window,
    );
    let decision = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Umpire, outcome(3), 2, 100),
        window,
    );
    let ClaimDecision::Reached(record) = decision else {
        panic!("expected umpire override, got {decision:?}");
    };
    assert_eq!(record.method, ConsensusMethod::UmpireOverride);
    assert_eq!(record.outcome.runs_off_bat, 3);
}

/// Disagreeing claims open a dispute naming the differing fields.
#[test]
fn disagreement_opens_a_classified_dispute() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(5, 2);
    let window = MatchingWindow::default();

    consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(4), 1, 0),
        window,
    );
    let decision = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Away, outcome(1), 2, 100),
        window,
    );
    let ClaimDecision::Disputed(dispute) = decision else {
        panic!("expected a dispute, got {decision:?}");
    };
    assert_eq!(dispute.kind, DisputeKind::RunsDiffer);
    assert_eq!(dispute.claims.len(), 2);
    assert!(dispute.difference_summary.contains("runs_off_bat 4 vs 1"));
}

/// Disagreement classification prefers wicket over extra over runs.
#[test]
fn classification_prefers_the_most_material_field() {
    let with_wide = BallOutcome {
        extra_kind: ExtraKind::Wide,
        is_legal: false,
        ..outcome(0)
    };
    assert_eq!(classify_disagreement(&outcome(0), &with_wide), DisputeKind::ExtraKindDiffer);
    assert_eq!(classify_disagreement(&outcome(1), &outcome(2)), DisputeKind::RunsDiffer);

    let with_wicket = BallOutcome {
        is_wicket: true,
        ..outcome(0)
    };
    assert_eq!(classify_disagreement(&outcome(0), &with_wicket), DisputeKind::WicketDiffer);
}

/// A sibling outside the matching window does not match.
#[test]
fn claims_outside_the_window_stay_pending() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(2, 2);
    let window = MatchingWindow {
        max_age_ms: 1_000,
        max_events: 8,
    };

    consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(1), 1, 0),
        window,
    );
    // Five seconds later is outside the one-second test window.
    let decision = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, UserId::generate(), ScorerSide::Away, outcome(1), 2, 5_000),
        window,
    );
    assert_eq!(decision, ClaimDecision::Pending);
}

/// An identical resubmission from the same scorer is a duplicate.
#[test]
fn identical_resubmission_is_a_duplicate() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(1, 1);
    let window = MatchingWindow::default();
    let scorer = UserId::generate();

    consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, scorer, ScorerSide::Home, outcome(1), 1, 0),
        window,
    );
    let decision = consider_claim(
        &mut state,
        scope(match_id, innings_id, number),
        claim(innings_id, scorer, ScorerSide::Home, outcome(1), 2, 100),
        window,
    );
    assert_eq!(decision, ClaimDecision::Duplicate);
}

// ============================================================================
// SECTION: Window Expiry
// ============================================================================

/// Expired lone claims auto-accept only under the single-scorer policy.
#[test]
fn expiry_honours_the_single_scorer_policy() {
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(4, 1);
    let window = MatchingWindow {
        max_age_ms: 1_000,
        max_events: 8,
    };
    let now = Timestamp::from_unix_millis_saturating(10_000);

    let mut with_policy = ConsensusState::default();
    with_policy
        .pending
        .entry(number)
        .or_default()
        .push(claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(2), 1, 0));
    let sweep = sweep_expired(&mut with_policy, match_id, now, window, true);
    assert_eq!(sweep.accepted.len(), 1);
    assert_eq!(sweep.accepted[0].method, ConsensusMethod::SingleScorerAccepted);
    assert!((sweep.accepted[0].confidence - 0.5).abs() < f64::EPSILON);
    assert!(sweep.missing.is_empty());

    let mut without_policy = ConsensusState::default();
    without_policy
        .pending
        .entry(number)
        .or_default()
        .push(claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(2), 1, 0));
    let sweep = sweep_expired(&mut without_policy, match_id, now, window, false);
    assert!(sweep.accepted.is_empty());
    assert_eq!(sweep.missing.len(), 1);
    assert_eq!(sweep.missing[0].kind, DisputeKind::Missing);
}

/// Unexpired claims survive a sweep untouched.
#[test]
fn fresh_claims_survive_the_sweep() {
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let number = BallNumber::new(4, 1);
    let window = MatchingWindow::default();
    let now = Timestamp::from_unix_millis_saturating(1_000);

    let mut state = ConsensusState::default();
    state
        .pending
        .entry(number)
        .or_default()
        .push(claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(2), 1, 0));
    let sweep = sweep_expired(&mut state, match_id, now, window, true);
    assert!(sweep.accepted.is_empty());
    assert!(sweep.missing.is_empty());
    assert_eq!(state.pending.len(), 1);
}

// ============================================================================
// SECTION: Held Commits
// ============================================================================

/// Held commits release in logical order up to the earliest open dispute.
#[test]
fn held_commits_release_in_order_up_to_the_block() {
    let mut state = ConsensusState::default();
    let match_id = MatchId::generate();
    let innings_id = InningsId::generate();
    let window = MatchingWindow::default();

    // Reach consensus on three balls and park them as held.
    for ball in 2..=4u8 {
        let number = BallNumber::new(5, ball);
        consider_claim(
            &mut state,
            scope(match_id, innings_id, number),
            claim(innings_id, UserId::generate(), ScorerSide::Home, outcome(1), 1, 0),
            window,
        );
        let decision = consider_claim(
            &mut state,
            scope(match_id, innings_id, number),
            claim(innings_id, UserId::generate(), ScorerSide::Away, outcome(1), 2, 100),
            window,
        );
        let ClaimDecision::Reached(record) = decision else {
            panic!("expected consensus");
        };
        state.held.insert(number, record);
    }

    // With the earliest open dispute at 5.3, commits past it stay held.
    let released = release_held(&mut state, Some(BallNumber::new(5, 3)));
    let numbers: Vec<BallNumber> = released.iter().map(|record| record.number).collect();
    assert_eq!(numbers, vec![BallNumber::new(5, 2), BallNumber::new(5, 3)]);
    assert_eq!(state.held.len(), 1);

    // With every dispute closed the remainder drains in order.
    let released = release_held(&mut state, None);
    let numbers: Vec<BallNumber> = released.iter().map(|record| record.number).collect();
    assert_eq!(numbers, vec![BallNumber::new(5, 4)]);
    assert!(state.held.is_empty());
}
