// crates/crease-core/tests/legality.rs
// ============================================================================
// Module: Legality Tests
// Description: Tests for cricket-legality validation of submissions.
// ============================================================================
//! ## Overview
//! Checks membership, consecutive-over, extras-shape, boundary, and
//! dismissal-compatibility rules, plus a fully legal delivery.

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
use crease_core::BallSubmission;
use crease_core::BoundaryKind;
use crease_core::DismissalKind;
use crease_core::ExtraKind;
use crease_core::InningsId;
use crease_core::InningsState;
use crease_core::LegalityViolation;
use crease_core::MatchId;
use crease_core::MatchRules;
use crease_core::OverId;
use crease_core::PlayerId;
use crease_core::PlayingXiEntry;
use crease_core::TeamId;
use crease_core::WicketDetail;
use crease_core::check_legality;

/// Builds a playing side of eleven with the second player keeping wicket.
fn side() -> Vec<PlayingXiEntry> {
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

/// Submission helper over the given participants and outcome.
fn submission(
    striker: PlayerId,
    non_striker: PlayerId,
    bowler: PlayerId,
    outcome: BallOutcome,
) -> BallSubmission {
    BallSubmission {
        innings_id: InningsId::generate(),
        over_id: OverId::generate(),
        number: BallNumber::new(1, 1),
        bowler,
        striker,
        non_striker: Some(non_striker),
        outcome,
        shot_kind: None,
        fielding_position: None,
    }
}

/// Fresh innings state for the two sides.
fn fresh_innings() -> InningsState {
    InningsState::open(
        InningsId::generate(),
        MatchId::generate(),
        1,
        TeamId::generate(),
        TeamId::generate(),
        None,
    )
}

/// Dot-ball outcome.
fn dot() -> BallOutcome {
    BallOutcome::dot()
}

// ============================================================================
// SECTION: Membership
// ============================================================================

/// A fully legal delivery passes.
#[test]
fn legal_delivery_passes() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let submitted = submission(
        batting[0].player_id,
        batting[1].player_id,
        bowling[10].player_id,
        dot(),
    );
    assert_eq!(check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules), Ok(()));
}

/// Striker and non-striker must be distinct batting-side members.
#[test]
fn batsmen_must_be_distinct_members_of_the_batting_side() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();

    let same_player = submission(
        batting[0].player_id,
        batting[0].player_id,
        bowling[10].player_id,
        dot(),
    );
    assert_eq!(
        check_legality(&same_player, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::StrikerEqualsNonStriker)
    );

    let outsider = PlayerId::generate();
    let not_batting =
        submission(outsider, batting[1].player_id, bowling[10].player_id, dot());
    assert_eq!(
        check_legality(&not_batting, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BatsmanNotInBattingSide(outsider))
    );
}

/// The bowler must belong to the bowling side.
#[test]
fn bowler_must_be_in_the_bowling_side() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let outsider = PlayerId::generate();
    let submitted = submission(batting[0].player_id, batting[1].player_id, outsider, dot());
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BowlerNotInBowlingSide(outsider))
    );
}

/// The previous over's bowler cannot open the next over.
#[test]
fn consecutive_overs_are_barred_by_default() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let bowler = bowling[10].player_id;
    let mut innings = fresh_innings();
    innings.previous_bowler = Some(bowler);
    innings.ball_in_over = 0;
    let submitted = submission(batting[0].player_id, batting[1].player_id, bowler, dot());
    assert_eq!(
        check_legality(&submitted, &innings, &batting, &bowling, &rules),
        Err(LegalityViolation::ConsecutiveOvers(bowler))
    );

    let mut relaxed = rules;
    relaxed.allow_same_bowler_consecutive = true;
    assert_eq!(check_legality(&submitted, &innings, &batting, &bowling, &relaxed), Ok(()));
}

// ============================================================================
// SECTION: Outcome Shape
// ============================================================================

/// The legality flag must agree with the extra classification.
#[test]
fn legality_flag_must_match_the_extra_kind() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let mut outcome = dot();
    outcome.extra_kind = ExtraKind::Wide;
    // A wide cannot be flagged legal.
    let submitted =
        submission(batting[0].player_id, batting[1].player_id, bowling[10].player_id, outcome);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::LegalityFlagMismatch(ExtraKind::Wide))
    );
}

/// Runs off the bat are impossible on a wide.
#[test]
fn wide_cannot_score_off_the_bat() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let outcome = BallOutcome {
        runs_off_bat: 2,
        is_legal: false,
        extra_kind: ExtraKind::Wide,
        ..dot()
    };
    let submitted =
        submission(batting[0].player_id, batting[1].player_id, bowling[10].player_id, outcome);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BatRunsImpossible(ExtraKind::Wide))
    );
}

/// Boundary flags, kinds, and runs must agree.
#[test]
fn boundary_shape_must_be_consistent() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();

    let missing_kind = BallOutcome {
        runs_off_bat: 4,
        is_boundary: true,
        ..dot()
    };
    let submitted = submission(
        batting[0].player_id,
        batting[1].player_id,
        bowling[10].player_id,
        missing_kind,
    );
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BoundaryKindMismatch)
    );

    let wrong_runs = BallOutcome {
        runs_off_bat: 3,
        is_boundary: true,
        boundary_kind: Some(BoundaryKind::Four),
        ..dot()
    };
    let submitted = submission(
        batting[0].player_id,
        batting[1].player_id,
        bowling[10].player_id,
        wrong_runs,
    );
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BoundaryRunsMismatch)
    );
}

// ============================================================================
// SECTION: Dismissal Compatibility
// ============================================================================

/// Bowler-credited dismissals name the delivery bowler; run-outs never do.
#[test]
fn bowler_credit_follows_the_dismissal_kind() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let striker = batting[0].player_id;
    let bowler = bowling[10].player_id;

    let uncredited_bowled = BallOutcome {
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::Bowled,
            batsman_out: striker,
            bowler_credit: None,
            fielders: Vec::new(),
        }),
        ..dot()
    };
    let submitted = submission(striker, batting[1].player_id, bowler, uncredited_bowled);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BowlerCreditRequired(DismissalKind::Bowled))
    );

    let credited_run_out = BallOutcome {
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::RunOut,
            batsman_out: striker,
            bowler_credit: Some(bowler),
            fielders: vec![bowling[3].player_id],
        }),
        ..dot()
    };
    let submitted = submission(striker, batting[1].player_id, bowler, credited_run_out);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::BowlerCreditForbidden(DismissalKind::RunOut))
    );
}

/// Bowled is impossible off a wide; stumped requires a keeper.
#[test]
fn dismissals_respect_the_delivery_and_the_keeper() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let striker = batting[0].player_id;
    let bowler = bowling[10].player_id;

    let bowled_off_wide = BallOutcome {
        is_legal: false,
        extra_kind: ExtraKind::Wide,
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::Bowled,
            batsman_out: striker,
            bowler_credit: Some(bowler),
            fielders: Vec::new(),
        }),
        ..dot()
    };
    let submitted = submission(striker, batting[1].player_id, bowler, bowled_off_wide);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::DismissalImpossible {
            kind: DismissalKind::Bowled,
            extra: ExtraKind::Wide,
        })
    );

    // Strip the keeper flag and a stumping becomes impossible.
    let mut keeperless = side();
    for entry in &mut keeperless {
        entry.is_keeper = false;
    }
    let stumped = BallOutcome {
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::Stumped,
            batsman_out: striker,
            bowler_credit: Some(keeperless[10].player_id),
            fielders: Vec::new(),
        }),
        ..dot()
    };
    let submitted =
        submission(striker, batting[1].player_id, keeperless[10].player_id, stumped);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &keeperless, &rules),
        Err(LegalityViolation::KeeperRequired)
    );
}

/// Only run-out style dismissals can remove the non-striker.
#[test]
fn striker_only_dismissals_cannot_remove_the_non_striker() {
    let batting = side();
    let bowling = side();
    let rules = MatchRules::t20();
    let striker = batting[0].player_id;
    let non_striker = batting[1].player_id;
    let bowler = bowling[10].player_id;

    let caught_non_striker = BallOutcome {
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::Caught,
            batsman_out: non_striker,
            bowler_credit: Some(bowler),
            fielders: vec![bowling[2].player_id],
        }),
        ..dot()
    };
    let submitted = submission(striker, non_striker, bowler, caught_non_striker);
    assert_eq!(
        check_legality(&submitted, &fresh_innings(), &batting, &bowling, &rules),
        Err(LegalityViolation::NonStrikerDismissalImpossible(DismissalKind::Caught))
    );
}
