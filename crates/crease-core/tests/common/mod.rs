// crates/crease-core/tests/common/mod.rs
// ============================================================================
// Module: Test Fixture
// Description: Shared match fixture driving the engine through full games.
// Purpose: Give scenario tests one deterministic setup and submission helper.
// Dependencies: crease-core
// ============================================================================
//! ## Overview
//! Builds a two-team match with registered scorers on both sides, a neutral
//! official, and a deterministic logical clock, then exposes helpers for the
//! full command surface so scenario tests read like scorecards.

#![allow(
    dead_code,
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

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use crease_core::BallDisposition;
use crease_core::BallNumber;
use crease_core::BallOutcome;
use crease_core::BallSubmission;
use crease_core::BoundaryKind;
use crease_core::CommandContext;
use crease_core::Committed;
use crease_core::CreateMatch;
use crease_core::DismissalKind;
use crease_core::EngineError;
use crease_core::ExtraKind;
use crease_core::InMemoryScoreStore;
use crease_core::InningsId;
use crease_core::MatchId;
use crease_core::MatchOfficial;
use crease_core::MatchRules;
use crease_core::MatchState;
use crease_core::OfficialRole;
use crease_core::OverId;
use crease_core::PlayerId;
use crease_core::PlayingXiEntry;
use crease_core::ScorerSide;
use crease_core::ScoringEngine;
use crease_core::TeamId;
use crease_core::Timestamp;
use crease_core::TossElection;
use crease_core::UserId;
use crease_core::WicketDetail;

/// Base instant for the deterministic logical clock (unix millis).
const CLOCK_BASE_MS: i64 = 1_780_000_000_000;

/// Full match fixture over the in-memory store.
pub struct Fixture {
    /// Engine under test.
    pub engine: ScoringEngine<InMemoryScoreStore>,
    /// Match under test.
    pub match_id: MatchId,
    /// Home side.
    pub team_a: TeamId,
    /// Away side.
    pub team_b: TeamId,
    /// Home players in batting order.
    pub players_a: Vec<PlayerId>,
    /// Away players in batting order.
    pub players_b: Vec<PlayerId>,
    /// Match creator.
    pub creator: UserId,
    /// Home-side scorer.
    pub scorer_a: UserId,
    /// Away-side scorer.
    pub scorer_b: UserId,
    /// Neutral umpire scorer.
    pub umpire: UserId,
    /// Match official (dispute resolver).
    pub official: UserId,
    /// Logical clock in unix millis.
    clock: AtomicI64,
}

impl Fixture {
    /// Builds a fixture with T20 rules.
    pub fn new() -> Self {
        Self::with_rules(MatchRules::t20())
    }

    /// Builds a fixture with explicit rules.
    pub fn with_rules(rules: MatchRules) -> Self {
        let engine = ScoringEngine::new(InMemoryScoreStore::new());
        let team_a = TeamId::generate();
        let team_b = TeamId::generate();
        let players_a: Vec<PlayerId> =
            (0..rules.players_per_side).map(|_| PlayerId::generate()).collect();
        let players_b: Vec<PlayerId> =
            (0..rules.players_per_side).map(|_| PlayerId::generate()).collect();
        let creator = UserId::generate();
        let scorer_a = UserId::generate();
        let scorer_b = UserId::generate();
        let umpire = UserId::generate();
        let official = UserId::generate();
        let officials = vec![
            MatchOfficial {
                user_id: scorer_a,
                role: OfficialRole::Scorer {
                    side: ScorerSide::Home,
                },
            },
            MatchOfficial {
                user_id: scorer_b,
                role: OfficialRole::Scorer {
                    side: ScorerSide::Away,
                },
            },
            MatchOfficial {
                user_id: umpire,
                role: OfficialRole::Scorer {
                    side: ScorerSide::Umpire,
                },
            },
            MatchOfficial {
                user_id: official,
                role: OfficialRole::Official,
            },
        ];
        let clock = AtomicI64::new(CLOCK_BASE_MS);
        let ctx = CommandContext {
            caller: creator,
            now: Timestamp::from_unix_millis_saturating(i128::from(CLOCK_BASE_MS)),
            correlation_id: None,
        };
        let state = engine
            .create_match(
                &ctx,
                CreateMatch {
                    team_a,
                    team_b,
                    rules,
                    officials,
                },
            )
            .expect("match creation");
        Self {
            engine,
            match_id: state.record.match_id,
            team_a,
            team_b,
            players_a,
            players_b,
            creator,
            scorer_a,
            scorer_b,
            umpire,
            official,
            clock,
        }
    }

    /// Advances the logical clock and returns the new instant.
    pub fn tick(&self) -> Timestamp {
        let millis = self.clock.fetch_add(100, Ordering::Relaxed) + 100;
        Timestamp::from_unix_millis_saturating(i128::from(millis))
    }

    /// Advances the logical clock by an explicit amount.
    pub fn advance_millis(&self, millis: i64) {
        self.clock.fetch_add(millis, Ordering::Relaxed);
    }

    /// Command context for a caller at the next tick.
    pub fn ctx(&self, caller: UserId) -> CommandContext {
        CommandContext {
            caller,
            now: self.tick(),
            correlation_id: None,
        }
    }

    /// Conducts the toss and sets both playing XIs, taking the match live.
    pub fn go_live(&self) {
        self.engine
            .conduct_toss(&self.ctx(self.creator), self.match_id, self.team_a, TossElection::Bat)
            .expect("toss");
        self.engine
            .set_playing_xi(&self.ctx(self.creator), self.match_id, self.team_a, xi(&self.players_a))
            .expect("xi a");
        self.engine
            .set_playing_xi(&self.ctx(self.creator), self.match_id, self.team_b, xi(&self.players_b))
            .expect("xi b");
    }

    /// Opens the next innings with the given batting side.
    pub fn open_innings(&self, batting_team: TeamId) -> InningsId {
        self.engine
            .open_innings(&self.ctx(self.scorer_a), self.match_id, batting_team)
            .expect("open innings")
            .value
            .innings_id
    }

    /// Assigns the batsmen.
    pub fn set_batsmen(&self, innings_id: InningsId, striker: PlayerId, non_striker: Option<PlayerId>) {
        self.engine
            .set_batsmen(&self.ctx(self.scorer_a), self.match_id, innings_id, striker, non_striker)
            .expect("set batsmen");
    }

    /// Opens an over for a bowler.
    pub fn open_over(&self, innings_id: InningsId, over_number: u32, bowler: PlayerId) -> OverId {
        self.engine
            .open_over(&self.ctx(self.scorer_a), self.match_id, innings_id, over_number, bowler)
            .expect("open over")
            .value
            .over_id
    }

    /// Builds a submission for a coordinate and outcome.
    pub fn submission(
        &self,
        innings_id: InningsId,
        over_id: OverId,
        number: BallNumber,
        bowler: PlayerId,
        striker: PlayerId,
        non_striker: PlayerId,
        outcome: BallOutcome,
    ) -> BallSubmission {
        BallSubmission {
            innings_id,
            over_id,
            number,
            bowler,
            striker,
            non_striker: Some(non_striker),
            outcome,
            shot_kind: None,
            fielding_position: None,
        }
    }

    /// Submits one ball from a scorer.
    pub fn submit(
        &self,
        scorer: UserId,
        submission: BallSubmission,
    ) -> Result<Committed<BallDisposition>, EngineError> {
        self.engine.submit_ball(
            &self.ctx(scorer),
            self.match_id,
            submission,
            String::from("test-signature"),
            serde_json::Map::new(),
        )
    }

    /// Submits the same ball from both scorers, returning the second result.
    pub fn both_submit(&self, submission: &BallSubmission) -> Committed<BallDisposition> {
        self.submit(self.scorer_a, submission.clone()).expect("scorer a submission");
        self.submit(self.scorer_b, submission.clone()).expect("scorer b submission")
    }

    /// Loads the current aggregate.
    pub fn state(&self) -> MatchState {
        self.engine.snapshot(self.match_id).expect("snapshot")
    }
}

/// Builds a valid playing XI over the given players.
pub fn xi(players: &[PlayerId]) -> Vec<PlayingXiEntry> {
    players
        .iter()
        .enumerate()
        .map(|(index, player)| PlayingXiEntry {
            player_id: *player,
            can_bat: true,
            can_bowl: true,
            is_keeper: index == 1,
            is_captain: index == 0,
            batting_order: u8::try_from(index + 1).unwrap_or(u8::MAX),
        })
        .collect()
}

// ============================================================================
// SECTION: Outcome Builders
// ============================================================================

/// Plain delivery scoring `runs` off the bat; 4s and 6s are boundaries.
pub fn runs(runs: u32) -> BallOutcome {
    BallOutcome {
        runs_off_bat: runs,
        is_boundary: matches!(runs, 4 | 6),
        boundary_kind: match runs {
            4 => Some(BoundaryKind::Four),
            6 => Some(BoundaryKind::Six),
            _ => None,
        },
        is_legal: true,
        extra_kind: ExtraKind::None,
        extra_runs: 0,
        is_wicket: false,
        wicket: None,
    }
}

/// Wide with additional ran runs.
pub fn wide(additional: u32) -> BallOutcome {
    BallOutcome {
        runs_off_bat: 0,
        is_boundary: false,
        boundary_kind: None,
        is_legal: false,
        extra_kind: ExtraKind::Wide,
        extra_runs: additional,
        is_wicket: false,
        wicket: None,
    }
}

/// Legal delivery with the striker caught.
pub fn caught(striker: PlayerId, bowler: PlayerId, fielder: PlayerId) -> BallOutcome {
    BallOutcome {
        runs_off_bat: 0,
        is_boundary: false,
        boundary_kind: None,
        is_legal: true,
        extra_kind: ExtraKind::None,
        extra_runs: 0,
        is_wicket: true,
        wicket: Some(WicketDetail {
            dismissal: DismissalKind::Caught,
            batsman_out: striker,
            bowler_credit: Some(bowler),
            fielders: vec![fielder],
        }),
    }
}

/// Logical ball coordinate shorthand.
pub const fn ball(over: u32, ball_in_over: u8) -> BallNumber {
    BallNumber::new(over, ball_in_over)
}
