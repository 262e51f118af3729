// crates/crease-core/src/runtime/engine.rs
// ============================================================================
// Module: Scoring Engine
// Description: Canonical execution path from command to commit to broadcast.
// Purpose: Order append, consensus, projection, and lifecycle under one writer.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The scoring engine is the single canonical execution path for a match.
//! Every command follows the same shape: authorise against the match record,
//! validate preconditions, append raw events to the hash chain, run the
//! consensus decision, apply canonical commits to the projection, advance the
//! lifecycle, and persist everything in one store commit. The caller holds
//! the per-match lock, so sequence numbers and `prior_hash` linkage are
//! trivially correct. Emitted [`EngineEvent`]s are the deltas the
//! subscription hub fans out; the engine itself never blocks on subscribers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::ball::BallNumber;
use crate::core::ball::BallOutcome;
use crate::core::ball::CanonicalBall;
use crate::core::ball::WicketRecord;
use crate::core::dispute::ConsensusMethod;
use crate::core::dispute::ConsensusRecord;
use crate::core::dispute::Dispute;
use crate::core::dispute::DisputeStatus;
use crate::core::event::BallSubmission;
use crate::core::event::EventPayload;
use crate::core::event::RawEvent;
use crate::core::event::ScorerSide;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::chain_event_hash;
use crate::core::hashing::derive_uuid;
use crate::core::identifiers::BallId;
use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::DisputeId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::OverId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::UserId;
use crate::core::innings::InningsEndReason;
use crate::core::innings::InningsState;
use crate::core::innings::OverState;
use crate::core::match_state::MatchOfficial;
use crate::core::match_state::MatchRecord;
use crate::core::match_state::MatchStage;
use crate::core::match_state::MatchState;
use crate::core::match_state::PendingClaim;
use crate::core::match_state::TossElection;
use crate::core::projection::FallOfWicket;
use crate::core::rules::MatchRules;
use crate::core::team::PlayingXiEntry;
use crate::core::team::side_contains;
use crate::core::time::Timestamp;
use crate::interfaces::ScoreStore;
use crate::interfaces::StoreError;
use crate::runtime::consensus;
use crate::runtime::consensus::ClaimDecision;
use crate::runtime::consensus::ClaimScope;
use crate::runtime::effect::Milestone;
use crate::runtime::effect::delivery_effect;
use crate::runtime::legality::LegalityViolation;
use crate::runtime::legality::check_legality;
use crate::runtime::lifecycle;
use crate::runtime::lifecycle::LifecycleError;
use crate::runtime::projector;
use crate::runtime::projector::ProjectorError;

// ============================================================================
// SECTION: Command Context
// ============================================================================

/// Per-command caller context supplied by the API boundary.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Verified caller identity.
    pub caller: UserId,
    /// Command timestamp; the engine never reads the wall clock.
    pub now: Timestamp,
    /// Correlation identifier threaded into audit and errors.
    pub correlation_id: Option<CorrelationId>,
}

// ============================================================================
// SECTION: Engine Events
// ============================================================================

/// Derived delta emitted by a committed command, for room fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A canonical ball was committed to the projection.
    BallCommitted {
        /// The committed ball.
        ball: CanonicalBall,
        /// Innings state after the commit.
        innings: InningsState,
    },
    /// Consensus was reached but the commit is held behind an open dispute.
    BallHeld {
        /// Owning innings.
        innings_id: InningsId,
        /// Logical ball held.
        number: BallNumber,
        /// Outcome that will commit on release.
        outcome: BallOutcome,
    },
    /// A wicket fell on a committed ball.
    WicketFallen {
        /// The committed ball carrying the wicket.
        ball: CanonicalBall,
        /// Fall-of-wicket entry.
        fall: FallOfWicket,
        /// Innings state after the commit.
        innings: InningsState,
    },
    /// An over completed.
    OverCompleted {
        /// The completed over.
        over: OverState,
        /// Innings state after completion.
        innings: InningsState,
    },
    /// An innings completed.
    InningsCompleted {
        /// Innings state at completion.
        innings: InningsState,
        /// Termination reason.
        reason: InningsEndReason,
    },
    /// The match completed with a result.
    MatchCompleted {
        /// Final lifecycle record.
        record: MatchRecord,
    },
    /// Batsmen or bowler assignment changed.
    PlayerChanged {
        /// Owning innings.
        innings_id: InningsId,
        /// Batsman on strike.
        striker: Option<PlayerId>,
        /// Batsman off strike.
        non_striker: Option<PlayerId>,
        /// Current bowler.
        bowler: Option<PlayerId>,
    },
    /// A milestone was achieved.
    MilestoneAchieved {
        /// Owning innings.
        innings_id: InningsId,
        /// The milestone.
        milestone: Milestone,
    },
    /// A scoring dispute was opened.
    DisputeRaised {
        /// The dispute record.
        dispute: Dispute,
    },
    /// A scoring dispute was resolved.
    DisputeResolved {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Logical ball settled.
        number: BallNumber,
        /// Resolution method.
        method: ConsensusMethod,
    },
    /// Canonical balls committed in order after a resolution.
    Reconciliation {
        /// Owning innings.
        innings_id: InningsId,
        /// Balls committed, in logical order.
        balls: Vec<CanonicalBall>,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Engine command failures, tagged for the API error taxonomy.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Caller lacks the role for this command on this match.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Referenced entity is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// State machine or sequencing violation.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    /// Duplicate identity or idempotent resubmission.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Cricket legality violation in a submission.
    #[error(transparent)]
    Legality(#[from] LegalityViolation),
    /// Lifecycle transition violation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// Projection inconsistency; indicates an engine bug.
    #[error(transparent)]
    Projector(#[from] ProjectorError),
    /// Canonicalization failure; indicates an engine bug.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Command Inputs
// ============================================================================

/// Input for match creation.
#[derive(Debug, Clone)]
pub struct CreateMatch {
    /// First party (home side).
    pub team_a: TeamId,
    /// Second party (away side).
    pub team_b: TeamId,
    /// Rules configuration, frozen at go-live.
    pub rules: MatchRules,
    /// Registered officials: scorers, captains, and match officials.
    pub officials: Vec<MatchOfficial>,
}

/// Outcome of a committed command: the result value plus broadcast deltas.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// Command result value.
    pub value: T,
    /// Deltas for room fan-out, in emission order.
    pub events: Vec<EngineEvent>,
    /// Raw-log sequence after the command, for replay resume hints.
    pub sequence: u64,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// The per-match scoring engine over a pluggable store.
///
/// All API surfaces route through these methods; the caller serializes
/// commands per match.
pub struct ScoringEngine<S> {
    /// Persistence seam for the event log and the aggregate.
    store: S,
    /// Hash algorithm for the event chain.
    hash_algorithm: HashAlgorithm,
}

impl<S: ScoreStore> ScoringEngine<S> {
    /// Creates an engine over a store.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }

    /// Read access to the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Setup commands
    // ------------------------------------------------------------------

    /// Creates a match.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the parties are identical, the rules are
    /// invalid, or persistence fails.
    pub fn create_match(
        &self,
        ctx: &CommandContext,
        input: CreateMatch,
    ) -> Result<MatchState, EngineError> {
        if input.team_a == input.team_b {
            return Err(EngineError::FailedPrecondition(String::from(
                "a match needs two distinct teams",
            )));
        }
        input.rules.validate().map_err(|err| EngineError::InvalidArgument(err.to_string()))?;
        let record = MatchRecord {
            match_id: MatchId::generate(),
            team_a: input.team_a,
            team_b: input.team_b,
            rules: input.rules,
            toss: None,
            stage: MatchStage::Scheduled,
            created_by: ctx.caller,
            playing_xi: std::collections::BTreeMap::new(),
            officials: input.officials,
            result: None,
            created_at: ctx.now,
        };
        let state = MatchState::new(record);
        self.store.commit(&[], &state)?;
        Ok(state)
    }

    /// Records the toss. Only the match creator may conduct it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, lifecycle, or store failure.
    pub fn conduct_toss(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        won_by: TeamId,
        elected: TossElection,
    ) -> Result<MatchState, EngineError> {
        let mut state = self.load(match_id)?;
        if state.record.created_by != ctx.caller {
            return Err(EngineError::PermissionDenied(String::from(
                "only the match creator may conduct the toss",
            )));
        }
        lifecycle::conduct_toss(&mut state.record, won_by, elected, ctx.now)?;
        self.store.commit(&[], &state)?;
        Ok(state)
    }

    /// Sets a team's playing XI. Captains of the team and the creator may.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, validation, or store failure.
    pub fn set_playing_xi(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        team: TeamId,
        entries: Vec<PlayingXiEntry>,
    ) -> Result<MatchState, EngineError> {
        let mut state = self.load(match_id)?;
        let allowed = state.record.created_by == ctx.caller
            || state.record.is_captain_of(ctx.caller, team);
        if !allowed {
            return Err(EngineError::PermissionDenied(String::from(
                "only the team captain or the match creator may set the playing XI",
            )));
        }
        lifecycle::set_playing_xi(&mut state.record, team, entries)?;
        self.store.commit(&[], &state)?;
        Ok(state)
    }

    // ------------------------------------------------------------------
    // Innings and over commands
    // ------------------------------------------------------------------

    /// Opens the next innings. Registered scorers may.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, lifecycle, or store failure.
    pub fn open_innings(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        batting_team: TeamId,
    ) -> Result<Committed<InningsState>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;

        if batting_team != state.record.team_a && batting_team != state.record.team_b {
            return Err(EngineError::InvalidArgument(format!(
                "team {batting_team} is not a party to this match"
            )));
        }
        let innings_number =
            u8::try_from(state.projection.innings_order.len() + 1).unwrap_or(u8::MAX);
        if innings_number > state.record.rules.innings_count {
            return Err(EngineError::from(LifecycleError::NoInningsRemaining));
        }
        match state.record.stage {
            MatchStage::Live => {
                if state.projection.current_innings().is_some_and(|i| !i.state.completed) {
                    return Err(EngineError::from(LifecycleError::PreviousInningsOpen));
                }
            }
            MatchStage::InningsBreak => {
                lifecycle::resume_live(&mut state.record)?;
            }
            stage => {
                return Err(EngineError::from(LifecycleError::InvalidTransition {
                    stage,
                    action: "open_innings",
                }));
            }
        }
        let bowling_team = if batting_team == state.record.team_a {
            state.record.team_b
        } else {
            state.record.team_a
        };
        let target = state
            .projection
            .current_innings()
            .filter(|innings| innings.state.completed)
            .map(|innings| innings.state.total_runs);

        let innings_id = InningsId::generate();
        let payload = EventPayload::InningsOpened {
            innings_id,
            innings_number,
            batting_team,
            bowling_team,
            target,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        projector::open_innings(
            &mut state.projection,
            match_id,
            innings_id,
            innings_number,
            batting_team,
            bowling_team,
            target,
        )?;
        let innings = self.innings_state(&state, innings_id)?.clone();
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: innings,
            events: Vec::new(),
            sequence: state.chain_tail.last_sequence,
        })
    }

    /// Assigns the current batsmen. Registered scorers may.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, validation, or store failure.
    pub fn set_batsmen(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        innings_id: InningsId,
        striker: PlayerId,
        non_striker: Option<PlayerId>,
    ) -> Result<Committed<InningsState>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        let batting_team = self.innings_state(&state, innings_id)?.batting_team;
        let batting_side = self.playing_side(&state, batting_team)?;
        if !side_contains(batting_side, striker) {
            return Err(EngineError::InvalidArgument(format!(
                "striker {striker} is not in the batting side"
            )));
        }
        if let Some(player) = non_striker {
            if !side_contains(batting_side, player) {
                return Err(EngineError::InvalidArgument(format!(
                    "non-striker {player} is not in the batting side"
                )));
            }
            if player == striker {
                return Err(EngineError::InvalidArgument(String::from(
                    "striker and non-striker must be distinct",
                )));
            }
        }
        let payload = EventPayload::BatsmenSet {
            innings_id,
            striker,
            non_striker,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        projector::set_batsmen(&mut state.projection, innings_id, striker, non_striker)?;
        let innings = self.innings_state(&state, innings_id)?.clone();
        let events = vec![EngineEvent::PlayerChanged {
            innings_id,
            striker: innings.striker,
            non_striker: innings.non_striker,
            bowler: innings.current_bowler,
        }];
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: innings,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    /// Assigns the current bowler. Registered scorers may.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, validation, or store failure.
    pub fn set_bowler(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        innings_id: InningsId,
        bowler: PlayerId,
    ) -> Result<Committed<InningsState>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        let innings = self.innings_state(&state, innings_id)?;
        let bowling_team = innings.bowling_team;
        let previous_bowler = innings.previous_bowler;
        let bowling_side = self.playing_side(&state, bowling_team)?;
        if !side_contains(bowling_side, bowler) {
            return Err(EngineError::InvalidArgument(format!(
                "bowler {bowler} is not in the bowling side"
            )));
        }
        if !state.record.rules.allow_same_bowler_consecutive && previous_bowler == Some(bowler) {
            return Err(EngineError::FailedPrecondition(format!(
                "bowler {bowler} cannot bowl consecutive overs"
            )));
        }
        let payload = EventPayload::BowlerSet {
            innings_id,
            bowler,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        projector::set_bowler(&mut state.projection, innings_id, bowler)?;
        let innings = self.innings_state(&state, innings_id)?.clone();
        let events = vec![EngineEvent::PlayerChanged {
            innings_id,
            striker: innings.striker,
            non_striker: innings.non_striker,
            bowler: innings.current_bowler,
        }];
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: innings,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    /// Opens a new over. Registered scorers may.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, sequencing, duplicate, or
    /// store failure.
    pub fn open_over(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        innings_id: InningsId,
        over_number: u32,
        bowler: PlayerId,
    ) -> Result<Committed<OverState>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        let innings = self.innings_state(&state, innings_id)?;
        if innings.completed {
            return Err(EngineError::FailedPrecondition(String::from(
                "cannot open an over in a completed innings",
            )));
        }
        let bowling_team = innings.bowling_team;
        let previous_bowler = innings.previous_bowler;
        let current_over = innings.current_over;
        let projection_innings = state
            .projection
            .innings_by_id(innings_id)
            .ok_or_else(|| EngineError::NotFound(format!("innings {innings_id}")))?;
        if projection_innings.overs.contains_key(&over_number) {
            return Err(EngineError::Conflict(format!("over {over_number} already exists")));
        }
        if over_number != current_over {
            return Err(EngineError::FailedPrecondition(format!(
                "expected over {current_over}, got {over_number}"
            )));
        }
        let bowling_side = self.playing_side(&state, bowling_team)?;
        if !side_contains(bowling_side, bowler) {
            return Err(EngineError::InvalidArgument(format!(
                "bowler {bowler} is not in the bowling side"
            )));
        }
        if !state.record.rules.allow_same_bowler_consecutive && previous_bowler == Some(bowler) {
            return Err(EngineError::FailedPrecondition(format!(
                "bowler {bowler} cannot bowl consecutive overs"
            )));
        }
        let over_id = OverId::generate();
        let payload = EventPayload::OverOpened {
            innings_id,
            over_id,
            over_number,
            bowler,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        projector::open_over(&mut state.projection, innings_id, over_id, over_number, bowler)?;
        let over = state
            .projection
            .innings_by_id(innings_id)
            .and_then(|innings| innings.overs.get(&over_number))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("over {over_number}")))?;
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: over,
            events: Vec::new(),
            sequence: state.chain_tail.last_sequence,
        })
    }

    // ------------------------------------------------------------------
    // Ball submission
    // ------------------------------------------------------------------

    /// Submits one delivery from a scorer. The primary scoring endpoint.
    ///
    /// Appends the raw event, runs the consensus decision, and commits the
    /// canonical ball when consensus is reached and no earlier dispute holds
    /// it back.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, legality, sequencing,
    /// duplicate submission, or store failure.
    pub fn submit_ball(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        submission: BallSubmission,
        signature: String,
        extensions: Map<String, Value>,
    ) -> Result<Committed<BallDisposition>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        if state.record.stage != MatchStage::Live {
            return Err(EngineError::FailedPrecondition(format!(
                "balls can only be submitted while the match is live, not {}",
                state.record.stage
            )));
        }
        self.validate_submission(&state, &submission)?;
        self.check_duplicate(&state, ctx.caller, &submission)?;

        let mut events = Vec::new();

        // Sweep claims whose matching window has expired before taking the
        // new claim; lone claims either auto-accept or park in a dispute.
        let sweep = consensus::sweep_expired(
            &mut state.consensus,
            match_id,
            ctx.now,
            state.record.rules.matching_window,
            state.record.rules.single_scorer_policy,
        );
        for record in sweep.accepted {
            self.commit_or_hold(&mut state, record, &mut events)?;
        }
        for dispute in sweep.missing {
            events.push(EngineEvent::DisputeRaised {
                dispute: dispute.clone(),
            });
            state.disputes.push(dispute);
        }

        let payload = EventPayload::BallRecorded {
            submission: submission.clone(),
        };
        let mut raw_events = Vec::new();
        let event = self.seal_event_with_extensions(
            &mut state,
            ctx,
            side,
            payload,
            signature,
            extensions,
        )?;
        let event_id = event.event_id;
        let sequence = event.sequence;
        raw_events.push(event);

        let claim = PendingClaim {
            event_id,
            innings_id: submission.innings_id,
            scorer_id: ctx.caller,
            scorer_side: side,
            outcome: submission.outcome.clone(),
            shot_kind: submission.shot_kind.clone(),
            fielding_position: submission.fielding_position.clone(),
            sequence,
            recorded_at: ctx.now,
        };
        let scope = ClaimScope {
            match_id,
            innings_id: submission.innings_id,
            number: submission.number,
        };
        let decision = consensus::consider_claim(
            &mut state.consensus,
            scope,
            claim,
            state.record.rules.matching_window,
        );

        let disposition = match decision {
            ClaimDecision::Duplicate => {
                return Err(EngineError::Conflict(String::from(
                    "identical submission already accepted from this scorer",
                )));
            }
            ClaimDecision::Pending => BallDisposition::Pending,
            ClaimDecision::Disputed(dispute) => {
                let dispute_payload = EventPayload::DisputeRaised {
                    dispute_id: dispute.dispute_id,
                    number: dispute.number,
                };
                let dispute_event =
                    self.seal_event(&mut state, ctx, side, dispute_payload, String::new())?;
                raw_events.push(dispute_event);
                events.push(EngineEvent::DisputeRaised {
                    dispute: dispute.clone(),
                });
                state.disputes.push(dispute.clone());
                BallDisposition::Disputed {
                    dispute_id: dispute.dispute_id,
                }
            }
            ClaimDecision::Reached(record) => self.commit_or_hold(&mut state, record, &mut events)?,
        };

        self.store.commit(&raw_events, &state)?;
        Ok(Committed {
            value: disposition,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    /// Attaches a dismissal to the caller's pending claim for a ball.
    ///
    /// Once a canonical ball exists for the coordinate the command is
    /// rejected; corrections are the only way to amend committed balls.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, missing pending claim, or
    /// store failure.
    pub fn record_wicket(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        innings_id: InningsId,
        number: BallNumber,
        wicket: crate::core::ball::WicketDetail,
    ) -> Result<Committed<BallDisposition>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;

        let pending = state
            .consensus
            .pending
            .get(&number)
            .and_then(|claims| claims.iter().find(|claim| claim.scorer_id == ctx.caller));
        let Some(existing) = pending else {
            let committed_here = state
                .projection
                .innings_by_id(innings_id)
                .is_some_and(|innings| innings.balls.iter().any(|ball| ball.number == number));
            if committed_here {
                return Err(EngineError::FailedPrecondition(format!(
                    "ball {number} is already canonical; submit a correction instead"
                )));
            }
            return Err(EngineError::FailedPrecondition(format!(
                "no pending delivery at {number} from this scorer"
            )));
        };
        let existing = existing.clone();
        let mut outcome = existing.outcome.clone();
        outcome.is_wicket = true;
        outcome.wicket = Some(wicket.clone());

        let payload = EventPayload::WicketRecorded {
            innings_id,
            number,
            wicket,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        let claim = PendingClaim {
            event_id: event.event_id,
            innings_id,
            scorer_id: ctx.caller,
            scorer_side: side,
            outcome,
            shot_kind: existing.shot_kind.clone(),
            fielding_position: existing.fielding_position.clone(),
            sequence: event.sequence,
            recorded_at: ctx.now,
        };
        let scope = ClaimScope {
            match_id,
            innings_id,
            number,
        };
        let mut events = Vec::new();
        let decision = consensus::consider_claim(
            &mut state.consensus,
            scope,
            claim,
            state.record.rules.matching_window,
        );
        let disposition = match decision {
            ClaimDecision::Duplicate => BallDisposition::Pending,
            ClaimDecision::Pending => BallDisposition::Pending,
            ClaimDecision::Disputed(dispute) => {
                events.push(EngineEvent::DisputeRaised {
                    dispute: dispute.clone(),
                });
                state.disputes.push(dispute.clone());
                BallDisposition::Disputed {
                    dispute_id: dispute.dispute_id,
                }
            }
            ClaimDecision::Reached(record) => self.commit_or_hold(&mut state, record, &mut events)?,
        };
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: disposition,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    /// Closes an innings by declaration or administrative action.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, lifecycle, or store failure.
    pub fn close_innings(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        innings_id: InningsId,
        declared: bool,
    ) -> Result<Committed<InningsState>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        let payload = EventPayload::InningsClosed {
            innings_id,
            declared,
        };
        let event = self.seal_event(&mut state, ctx, side, payload, String::new())?;
        let reason = projector::close_innings(&mut state.projection, innings_id, declared)?;
        let innings = self.innings_state(&state, innings_id)?.clone();
        let mut events = vec![EngineEvent::InningsCompleted {
            innings: innings.clone(),
            reason,
        }];
        self.advance_after_innings(&mut state, &mut events)?;
        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: innings,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    // ------------------------------------------------------------------
    // Dispute resolution
    // ------------------------------------------------------------------

    /// Resolves an open dispute with a final payload. Officials only.
    ///
    /// Commits the settled ball, releases held commits in logical order, and
    /// emits a reconciliation listing everything that reached the projection.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, unknown or settled dispute,
    /// or store failure. Authorisation failures never touch the log.
    pub fn resolve_dispute(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        dispute_id: DisputeId,
        final_outcome: BallOutcome,
    ) -> Result<Committed<Dispute>, EngineError> {
        let mut state = self.load(match_id)?;
        if !state.record.is_official(ctx.caller) {
            return Err(EngineError::PermissionDenied(String::from(
                "only a match official may resolve disputes",
            )));
        }
        let dispute_index = state
            .disputes
            .iter()
            .position(|dispute| dispute.dispute_id == dispute_id)
            .ok_or_else(|| EngineError::NotFound(format!("dispute {dispute_id}")))?;
        if state.disputes[dispute_index].status != DisputeStatus::Open {
            return Err(EngineError::FailedPrecondition(String::from(
                "dispute is not open",
            )));
        }

        let payload = EventPayload::DisputeResolved {
            dispute_id,
            final_outcome: final_outcome.clone(),
        };
        let event =
            self.seal_event(&mut state, ctx, ScorerSide::Umpire, payload, String::new())?;

        let opened_at = state.disputes[dispute_index].opened_at;
        let latency = ctx.now.abs_distance(&opened_at).whole_milliseconds();
        {
            let dispute = &mut state.disputes[dispute_index];
            dispute.status = DisputeStatus::Resolved;
            dispute.resolved_at = Some(ctx.now);
            dispute.resolver_id = Some(ctx.caller);
            dispute.final_outcome = Some(final_outcome.clone());
            dispute.latency_ms = u64::try_from(latency.unsigned_abs()).ok();
        }
        let resolved = state.disputes[dispute_index].clone();
        let record =
            consensus::resolve_dispute(&resolved, final_outcome, ctx.caller, ctx.now);

        let mut events = vec![EngineEvent::DisputeResolved {
            dispute_id,
            number: resolved.number,
            method: ConsensusMethod::ManualResolution,
        }];

        // Commit the settled ball (or hold it behind a still-earlier open
        // dispute), then drain helds now in front of every remaining open
        // dispute, collecting everything applied for the reconciliation.
        let mut derived = Vec::new();
        self.commit_or_hold(&mut state, record, &mut derived)?;
        let earliest_open = state.earliest_open_dispute();
        let released = consensus::release_held(&mut state.consensus, earliest_open);
        for held in released {
            self.apply_consensus(&mut state, held, &mut derived)?;
        }
        let reconciled: Vec<CanonicalBall> = derived
            .iter()
            .filter_map(|event| match event {
                EngineEvent::BallCommitted {
                    ball, ..
                } => Some(ball.clone()),
                _ => None,
            })
            .collect();
        events.push(EngineEvent::Reconciliation {
            innings_id: resolved.innings_id,
            balls: reconciled,
        });
        // Over, innings, match, and milestone deltas follow the
        // reconciliation so clients apply the balls first.
        events.extend(derived.into_iter().filter(|event| {
            !matches!(event, EngineEvent::BallCommitted { .. } | EngineEvent::WicketFallen { .. })
        }));

        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: resolved,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    // ------------------------------------------------------------------
    // Corrections
    // ------------------------------------------------------------------

    /// Submits a correction for a committed canonical ball.
    ///
    /// Corrections are consensus subjects like balls: two opposite-side
    /// scorers must agree before a compensating ball commits. Only run and
    /// extra adjustments are accepted; wicket or legality changes go through
    /// dispute resolution.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on authorisation, unknown ball, unsupported
    /// change, or store failure.
    pub fn submit_correction(
        &self,
        ctx: &CommandContext,
        match_id: MatchId,
        original_ball: BallId,
        submission: BallSubmission,
        signature: String,
    ) -> Result<Committed<BallDisposition>, EngineError> {
        let mut state = self.load(match_id)?;
        let side = self.require_scorer(&state, ctx.caller)?;
        let original = self
            .find_ball(&state, original_ball)?
            .clone();
        if submission.outcome.is_wicket != original.outcome.is_wicket
            || submission.outcome.is_legal != original.outcome.is_legal
            || submission.outcome.extra_kind != original.outcome.extra_kind
        {
            return Err(EngineError::InvalidArgument(String::from(
                "corrections may only adjust runs; wicket or legality changes need a dispute resolution",
            )));
        }

        let payload = EventPayload::Correction {
            original_ball,
            submission: submission.clone(),
        };
        let event = self.seal_event(&mut state, ctx, side, payload, signature)?;
        let claim = PendingClaim {
            event_id: event.event_id,
            innings_id: original.innings_id,
            scorer_id: ctx.caller,
            scorer_side: side,
            outcome: submission.outcome.clone(),
            shot_kind: submission.shot_kind.clone(),
            fielding_position: submission.fielding_position.clone(),
            sequence: event.sequence,
            recorded_at: ctx.now,
        };

        let mut events = Vec::new();
        let corrections = state.consensus.pending_corrections.entry(original_ball).or_default();
        let own_index = corrections.iter().position(|entry| entry.scorer_id == ctx.caller);
        let sibling = corrections
            .iter()
            .find(|entry| entry.scorer_side != side && entry.outcome.agrees_with(&claim.outcome))
            .cloned();
        let disposition = if let Some(index) = own_index {
            if corrections[index].outcome == claim.outcome {
                return Err(EngineError::Conflict(String::from(
                    "identical correction already accepted from this scorer",
                )));
            }
            corrections[index] = claim;
            BallDisposition::Pending
        } else if let Some(sibling) = sibling {
            let event_ids = vec![sibling.event_id, claim.event_id];
            state.consensus.pending_corrections.remove(&original_ball);
            let ball = self.apply_compensation(
                &mut state,
                &original,
                submission.outcome.clone(),
                event_ids,
                ctx.now,
                &mut events,
            )?;
            BallDisposition::Committed {
                ball_id: ball.ball_id,
            }
        } else {
            corrections.push(claim);
            BallDisposition::Pending
        };

        self.store.commit(&[event], &state)?;
        Ok(Committed {
            value: disposition,
            events,
            sequence: state.chain_tail.last_sequence,
        })
    }

    // ------------------------------------------------------------------
    // Queries and audits
    // ------------------------------------------------------------------

    /// Loads the full aggregate for a match.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the match does not exist.
    pub fn snapshot(&self, match_id: MatchId) -> Result<MatchState, EngineError> {
        self.load(match_id)
    }

    /// Rebuilds the projection by replaying the raw event log.
    ///
    /// Given the same log prefix this yields the same projection as the
    /// incremental path; the determinism tests anchor on it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the log cannot be read or replayed.
    pub fn replay(&self, match_id: MatchId) -> Result<MatchState, EngineError> {
        let live = self.load(match_id)?;
        let events = self.store.read_range(match_id, 1, u64::MAX)?;
        let mut record = live.record.clone();
        record.result = None;
        if matches!(record.stage, MatchStage::Live | MatchStage::InningsBreak | MatchStage::Completed)
        {
            record.stage = MatchStage::Live;
        }
        let mut state = MatchState::new(record);
        for event in &events {
            self.replay_event(&mut state, event)?;
        }
        state.chain_tail = live.chain_tail.clone();
        Ok(state)
    }

    /// Applies one logged event during replay, mirroring the live path.
    fn replay_event(&self, state: &mut MatchState, event: &RawEvent) -> Result<(), EngineError> {
        let mut sink = Vec::new();
        match &event.payload {
            EventPayload::InningsOpened {
                innings_id,
                innings_number,
                batting_team,
                bowling_team,
                target,
            } => {
                if state.record.stage == MatchStage::InningsBreak {
                    lifecycle::resume_live(&mut state.record)?;
                }
                projector::open_innings(
                    &mut state.projection,
                    state.record.match_id,
                    *innings_id,
                    *innings_number,
                    *batting_team,
                    *bowling_team,
                    *target,
                )?;
            }
            EventPayload::OverOpened {
                innings_id,
                over_id,
                over_number,
                bowler,
            } => {
                projector::open_over(
                    &mut state.projection,
                    *innings_id,
                    *over_id,
                    *over_number,
                    *bowler,
                )?;
            }
            EventPayload::BatsmenSet {
                innings_id,
                striker,
                non_striker,
            } => {
                projector::set_batsmen(&mut state.projection, *innings_id, *striker, *non_striker)?;
            }
            EventPayload::BowlerSet {
                innings_id,
                bowler,
            } => {
                projector::set_bowler(&mut state.projection, *innings_id, *bowler)?;
            }
            EventPayload::BallRecorded {
                submission,
            } => {
                let claim = PendingClaim {
                    event_id: event.event_id,
                    innings_id: submission.innings_id,
                    scorer_id: event.scorer_id,
                    scorer_side: event.scorer_side,
                    outcome: submission.outcome.clone(),
                    shot_kind: submission.shot_kind.clone(),
                    fielding_position: submission.fielding_position.clone(),
                    sequence: event.sequence,
                    recorded_at: event.event_timestamp,
                };
                let scope = ClaimScope {
                    match_id: state.record.match_id,
                    innings_id: submission.innings_id,
                    number: submission.number,
                };
                let decision = consensus::consider_claim(
                    &mut state.consensus,
                    scope,
                    claim,
                    state.record.rules.matching_window,
                );
                match decision {
                    ClaimDecision::Reached(record) => {
                        self.commit_or_hold(state, record, &mut sink)?;
                    }
                    ClaimDecision::Disputed(dispute) => {
                        state.disputes.push(dispute);
                    }
                    ClaimDecision::Pending | ClaimDecision::Duplicate => {}
                }
            }
            EventPayload::WicketRecorded {
                innings_id,
                number,
                wicket,
            } => {
                let revised = state.consensus.pending.get(number).and_then(|claims| {
                    claims.iter().find(|claim| claim.scorer_id == event.scorer_id).cloned()
                });
                if let Some(mut claim) = revised {
                    claim.outcome.is_wicket = true;
                    claim.outcome.wicket = Some(wicket.clone());
                    claim.event_id = event.event_id;
                    claim.sequence = event.sequence;
                    claim.recorded_at = event.event_timestamp;
                    let scope = ClaimScope {
                        match_id: state.record.match_id,
                        innings_id: *innings_id,
                        number: *number,
                    };
                    let decision = consensus::consider_claim(
                        &mut state.consensus,
                        scope,
                        claim,
                        state.record.rules.matching_window,
                    );
                    match decision {
                        ClaimDecision::Reached(record) => {
                            self.commit_or_hold(state, record, &mut sink)?;
                        }
                        ClaimDecision::Disputed(dispute) => {
                            state.disputes.push(dispute);
                        }
                        ClaimDecision::Pending | ClaimDecision::Duplicate => {}
                    }
                }
            }
            EventPayload::InningsClosed {
                innings_id,
                declared,
            } => {
                projector::close_innings(&mut state.projection, *innings_id, *declared)?;
                self.advance_after_innings(state, &mut sink)?;
            }
            EventPayload::DisputeRaised {
                ..
            } => {}
            EventPayload::DisputeResolved {
                dispute_id,
                final_outcome,
            } => {
                let found = state
                    .disputes
                    .iter()
                    .position(|dispute| dispute.dispute_id == *dispute_id);
                if let Some(index) = found {
                    state.disputes[index].status = DisputeStatus::Resolved;
                    state.disputes[index].resolved_at = Some(event.event_timestamp);
                    state.disputes[index].resolver_id = Some(event.scorer_id);
                    state.disputes[index].final_outcome = Some(final_outcome.clone());
                    let resolved = state.disputes[index].clone();
                    let record = consensus::resolve_dispute(
                        &resolved,
                        final_outcome.clone(),
                        event.scorer_id,
                        event.event_timestamp,
                    );
                    self.apply_consensus(state, record, &mut sink)?;
                    let earliest_open = state.earliest_open_dispute();
                    let released =
                        consensus::release_held(&mut state.consensus, earliest_open);
                    for held in released {
                        self.apply_consensus(state, held, &mut sink)?;
                    }
                }
            }
            EventPayload::Correction {
                original_ball,
                submission,
            } => {
                let claim = PendingClaim {
                    event_id: event.event_id,
                    innings_id: submission.innings_id,
                    scorer_id: event.scorer_id,
                    scorer_side: event.scorer_side,
                    outcome: submission.outcome.clone(),
                    shot_kind: submission.shot_kind.clone(),
                    fielding_position: submission.fielding_position.clone(),
                    sequence: event.sequence,
                    recorded_at: event.event_timestamp,
                };
                let original = self.find_ball(state, *original_ball).ok().cloned();
                if let Some(original) = original {
                    let corrections =
                        state.consensus.pending_corrections.entry(*original_ball).or_default();
                    let sibling = corrections
                        .iter()
                        .find(|entry| {
                            entry.scorer_side != event.scorer_side
                                && entry.outcome.agrees_with(&claim.outcome)
                        })
                        .cloned();
                    if let Some(sibling) = sibling {
                        let event_ids = vec![sibling.event_id, claim.event_id];
                        state.consensus.pending_corrections.remove(original_ball);
                        self.apply_compensation(
                            state,
                            &original,
                            submission.outcome.clone(),
                            event_ids,
                            event.event_timestamp,
                            &mut sink,
                        )?;
                    } else {
                        corrections.push(claim);
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Loads the aggregate or reports the match missing.
    fn load(&self, match_id: MatchId) -> Result<MatchState, EngineError> {
        self.store
            .load(match_id)?
            .ok_or_else(|| EngineError::NotFound(format!("match {match_id}")))
    }

    /// Requires the caller to be a registered scorer and returns their side.
    fn require_scorer(
        &self,
        state: &MatchState,
        caller: UserId,
    ) -> Result<ScorerSide, EngineError> {
        state.record.scorer_side_of(caller).ok_or_else(|| {
            EngineError::PermissionDenied(String::from(
                "caller is not a registered scorer for this match",
            ))
        })
    }

    /// Returns the derived innings state by identifier.
    fn innings_state<'a>(
        &self,
        state: &'a MatchState,
        innings_id: InningsId,
    ) -> Result<&'a InningsState, EngineError> {
        state
            .projection
            .innings_by_id(innings_id)
            .map(|innings| &innings.state)
            .ok_or_else(|| EngineError::NotFound(format!("innings {innings_id}")))
    }

    /// Returns the playing XI of a team.
    fn playing_side<'a>(
        &self,
        state: &'a MatchState,
        team: TeamId,
    ) -> Result<&'a [PlayingXiEntry], EngineError> {
        state
            .record
            .playing_xi
            .get(&team)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                EngineError::FailedPrecondition(format!("playing XI for team {team} is not set"))
            })
    }

    /// Finds a committed canonical ball by identifier.
    fn find_ball<'a>(
        &self,
        state: &'a MatchState,
        ball_id: BallId,
    ) -> Result<&'a CanonicalBall, EngineError> {
        state
            .projection
            .innings
            .values()
            .flat_map(|innings| innings.balls.iter())
            .find(|ball| ball.ball_id == ball_id)
            .ok_or_else(|| EngineError::NotFound(format!("ball {ball_id}")))
    }

    /// Validates a submission's coordinates and cricket legality.
    fn validate_submission(
        &self,
        state: &MatchState,
        submission: &BallSubmission,
    ) -> Result<(), EngineError> {
        let innings = state
            .projection
            .innings_by_id(submission.innings_id)
            .ok_or_else(|| EngineError::NotFound(format!("innings {}", submission.innings_id)))?;
        if innings.state.completed {
            return Err(EngineError::FailedPrecondition(String::from(
                "cannot record a ball for a completed innings",
            )));
        }
        let over = innings.overs.get(&submission.number.over).ok_or_else(|| {
            EngineError::FailedPrecondition(format!("over {} is not open", submission.number.over))
        })?;
        if over.over_id != submission.over_id {
            return Err(EngineError::InvalidArgument(String::from(
                "over_id does not match the open over for this coordinate",
            )));
        }
        if over.completed {
            return Err(EngineError::FailedPrecondition(format!(
                "over {} has completed",
                submission.number.over
            )));
        }
        if innings.state.striker.is_none() {
            return Err(EngineError::FailedPrecondition(String::from(
                "no striker assigned; set the batsmen before recording balls",
            )));
        }
        let balls_per_over = state.record.rules.balls_per_over;
        if submission.number.ball_in_over == 0 || submission.number.ball_in_over > balls_per_over {
            return Err(EngineError::InvalidArgument(format!(
                "ball_in_over must be between 1 and {balls_per_over}"
            )));
        }
        if submission.number.over != innings.state.current_over {
            return Err(EngineError::FailedPrecondition(format!(
                "expected a ball in over {}, got {}",
                innings.state.current_over, submission.number.over
            )));
        }
        // A fresh claim must land exactly on the expected coordinate; the
        // only other valid target is a coordinate whose claims are still
        // pending, for the sibling scorer or a revision. Skipping ahead and
        // re-claiming settled coordinates are both out of sequence.
        let expected = expected_claim_coordinate(state, &innings.state);
        let joins_pending = state
            .consensus
            .pending
            .get(&submission.number)
            .is_some_and(|claims| !claims.is_empty());
        if submission.number != expected && !joins_pending {
            return Err(EngineError::FailedPrecondition(format!(
                "ball {} is out of sequence; expected {expected}",
                submission.number
            )));
        }

        let batting_side = self.playing_side(state, innings.state.batting_team)?;
        let bowling_side = self.playing_side(state, innings.state.bowling_team)?;
        check_legality(
            submission,
            &innings.state,
            batting_side,
            bowling_side,
            &state.record.rules,
        )?;
        Ok(())
    }

    /// Rejects an identical resubmission against pending and committed balls.
    fn check_duplicate(
        &self,
        state: &MatchState,
        caller: UserId,
        submission: &BallSubmission,
    ) -> Result<(), EngineError> {
        let committed_identical = state
            .projection
            .innings_by_id(submission.innings_id)
            .and_then(|innings| innings.balls.last())
            .is_some_and(|ball| {
                ball.number == submission.number && ball.outcome == submission.outcome
            });
        if committed_identical {
            return Err(EngineError::Conflict(String::from(
                "identical submission already committed for this ball",
            )));
        }
        let pending_identical = state.consensus.pending.get(&submission.number).is_some_and(
            |claims| {
                claims.iter().any(|claim| {
                    claim.scorer_id == caller && claim.outcome == submission.outcome
                })
            },
        );
        if pending_identical {
            return Err(EngineError::Conflict(String::from(
                "identical submission already accepted from this scorer",
            )));
        }
        Ok(())
    }

    /// Builds, hashes, and chains a raw event onto the match log.
    fn seal_event(
        &self,
        state: &mut MatchState,
        ctx: &CommandContext,
        side: ScorerSide,
        payload: EventPayload,
        signature: String,
    ) -> Result<RawEvent, EngineError> {
        self.seal_event_with_extensions(state, ctx, side, payload, signature, Map::new())
    }

    /// Builds, hashes, and chains a raw event with extension fields.
    fn seal_event_with_extensions(
        &self,
        state: &mut MatchState,
        ctx: &CommandContext,
        side: ScorerSide,
        payload: EventPayload,
        signature: String,
        extensions: Map<String, Value>,
    ) -> Result<RawEvent, EngineError> {
        let sequence = state.chain_tail.last_sequence + 1;
        let prior_hash = state.chain_tail.last_hash.clone();
        let digest = chain_event_hash(
            self.hash_algorithm,
            &prior_hash,
            ctx.caller,
            ctx.now,
            &payload,
        )?;
        let event = RawEvent {
            event_id: EventId::generate(),
            match_id: state.record.match_id,
            sequence,
            scorer_id: ctx.caller,
            scorer_side: side,
            payload,
            prior_hash,
            event_hash: digest.value.clone(),
            signature,
            event_timestamp: ctx.now,
            extensions,
        };
        state.chain_tail.last_sequence = sequence;
        state.chain_tail.last_hash = digest.value;
        Ok(event)
    }

    /// Applies or holds a reached consensus, emitting the matching deltas.
    fn commit_or_hold(
        &self,
        state: &mut MatchState,
        record: ConsensusRecord,
        events: &mut Vec<EngineEvent>,
    ) -> Result<BallDisposition, EngineError> {
        if let Some(blocking) = state.earliest_open_dispute() {
            if blocking < record.number {
                events.push(EngineEvent::BallHeld {
                    innings_id: record.innings_id,
                    number: record.number,
                    outcome: record.outcome.clone(),
                });
                let number = record.number;
                state.consensus.held.insert(number, record);
                return Ok(BallDisposition::Held {
                    number,
                });
            }
        }
        let ball = self.apply_consensus(state, record, events)?;
        Ok(BallDisposition::Committed {
            ball_id: ball.ball_id,
        })
    }

    /// Commits a consensus decision as a canonical ball and projects it.
    fn apply_consensus(
        &self,
        state: &mut MatchState,
        mut record: ConsensusRecord,
        events: &mut Vec<EngineEvent>,
    ) -> Result<CanonicalBall, EngineError> {
        let innings_id = record.innings_id;
        let innings = state
            .projection
            .innings_by_id(innings_id)
            .ok_or(ProjectorError::UnknownInnings(innings_id))?;
        let over = innings
            .overs
            .get(&record.number.over)
            .ok_or(ProjectorError::UnknownOver(record.number.over))?;

        // The projector fills the fall-of-wicket context after application;
        // the canonical record carries the same values computed up front.
        let effect = delivery_effect(&record.outcome);
        let wicket = record.outcome.wicket.clone().map(|detail| WicketRecord {
            detail,
            wicket_number: innings.state.wickets_fallen + 1,
            team_score_at_wicket: innings.state.total_runs + effect.total_runs(),
            partnership_runs: innings.state.total_runs + effect.total_runs()
                - innings.score_at_last_wicket,
        });

        let consensus_part = record.consensus_id.to_string();
        let striker = innings.state.striker.ok_or_else(|| {
            EngineError::FailedPrecondition(String::from(
                "no striker assigned; set the batsmen before committing balls",
            ))
        })?;
        let bowler = over.bowler;
        let non_striker = innings.state.non_striker;
        let over_id = over.over_id;
        let ball = CanonicalBall {
            ball_id: BallId::from_uuid(derive_uuid("ball", &[&consensus_part])),
            innings_id,
            over_id,
            number: record.number,
            bowler,
            striker,
            non_striker,
            outcome: record.outcome.clone(),
            wicket,
            consensus_id: record.consensus_id,
            confidence: record.confidence,
            shot_kind: None,
            fielding_position: None,
            bowled_at: record.decided_at,
            compensates: None,
        };
        let applied = projector::apply_ball(&mut state.projection, &ball, &state.record.rules)?;

        record.applied_to_ball = true;
        state.consensus_log.push(record);
        state.projection.last_committed_sequence = state.chain_tail.last_sequence;

        let innings_after = self.innings_state(state, innings_id)?.clone();
        events.push(EngineEvent::BallCommitted {
            ball: ball.clone(),
            innings: innings_after.clone(),
        });
        if let Some(fall) = applied.fall_of_wicket {
            events.push(EngineEvent::WicketFallen {
                ball: ball.clone(),
                fall,
                innings: innings_after.clone(),
            });
        }
        for milestone in applied.milestones {
            events.push(EngineEvent::MilestoneAchieved {
                innings_id,
                milestone,
            });
        }
        if applied.over_completed {
            let over = state
                .projection
                .innings_by_id(innings_id)
                .and_then(|innings| innings.overs.get(&ball.number.over))
                .cloned()
                .ok_or(ProjectorError::UnknownOver(ball.number.over))?;
            events.push(EngineEvent::OverCompleted {
                over,
                innings: innings_after.clone(),
            });
        }
        if let Some(reason) = applied.innings_ended {
            events.push(EngineEvent::InningsCompleted {
                innings: innings_after,
                reason,
            });
            self.advance_after_innings(state, events)?;
        }
        Ok(ball)
    }

    /// Commits a compensating canonical ball adjusting a committed one.
    fn apply_compensation(
        &self,
        state: &mut MatchState,
        original: &CanonicalBall,
        outcome: BallOutcome,
        event_ids: Vec<EventId>,
        decided_at: Timestamp,
        events: &mut Vec<EngineEvent>,
    ) -> Result<CanonicalBall, EngineError> {
        let old_effect = delivery_effect(&original.outcome);
        let new_effect = delivery_effect(&outcome);

        let id_parts: Vec<String> = event_ids.iter().map(ToString::to_string).collect();
        let original_part = original.ball_id.to_string();
        let mut parts: Vec<&str> = vec![&original_part];
        parts.extend(id_parts.iter().map(String::as_str));
        let consensus_id = crate::core::identifiers::ConsensusId::from_uuid(derive_uuid(
            "consensus-correction",
            &parts,
        ));

        let record = ConsensusRecord {
            consensus_id,
            match_id: state.record.match_id,
            innings_id: original.innings_id,
            number: original.number,
            event_ids,
            method: ConsensusMethod::ScorerMatch,
            confidence: ConsensusMethod::ScorerMatch.confidence(),
            outcome: outcome.clone(),
            applied_to_ball: true,
            authority_id: None,
            decided_at,
        };

        let ball = CanonicalBall {
            ball_id: BallId::from_uuid(derive_uuid("ball-correction", &parts)),
            innings_id: original.innings_id,
            over_id: original.over_id,
            number: original.number,
            bowler: original.bowler,
            striker: original.striker,
            non_striker: original.non_striker,
            outcome,
            wicket: None,
            consensus_id,
            confidence: record.confidence,
            shot_kind: None,
            fielding_position: None,
            bowled_at: decided_at,
            compensates: Some(original.ball_id),
        };

        // Adjust totals by the signed delta between the outcomes; the
        // cursor, wicket count, and rotation are untouched by corrections.
        let innings = state
            .projection
            .innings
            .get_mut(&original.innings_id)
            .ok_or(ProjectorError::UnknownInnings(original.innings_id))?;
        innings.state.total_runs = shift(innings.state.total_runs, old_effect.total_runs(), new_effect.total_runs());
        innings.state.extras_total =
            shift(innings.state.extras_total, old_effect.extras_runs, new_effect.extras_runs);
        if let Some(over) = innings.overs.get_mut(&original.number.over) {
            over.runs_conceded =
                shift(over.runs_conceded, old_effect.total_runs(), new_effect.total_runs());
            over.extras_in_over =
                shift(over.extras_in_over, old_effect.extras_runs, new_effect.extras_runs);
        }
        if let Some(batsman) = innings.batsmen.get_mut(&original.striker) {
            batsman.runs = shift(batsman.runs, old_effect.batsman_runs, new_effect.batsman_runs);
        }
        if old_effect.charges_bowler {
            if let Some(bowler) = innings.bowlers.get_mut(&original.bowler) {
                bowler.runs_conceded =
                    shift(bowler.runs_conceded, old_effect.total_runs(), new_effect.total_runs());
            }
        }
        innings.balls.push(ball.clone());

        state.consensus_log.push(record);
        state.projection.last_committed_sequence = state.chain_tail.last_sequence;

        let innings_after = self.innings_state(state, original.innings_id)?.clone();
        events.push(EngineEvent::BallCommitted {
            ball: ball.clone(),
            innings: innings_after,
        });
        Ok(ball)
    }

    /// Advances the match lifecycle after an innings completes.
    fn advance_after_innings(
        &self,
        state: &mut MatchState,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), EngineError> {
        let played = state.projection.completed_innings();
        let scheduled = usize::from(state.record.rules.innings_count);
        if played >= scheduled {
            let order = &state.projection.innings_order;
            let result = match (order.first(), order.last()) {
                (Some(first_id), Some(last_id)) if first_id != last_id => {
                    let first = self.innings_state(state, *first_id)?;
                    let last = self.innings_state(state, *last_id)?;
                    lifecycle::compute_result(first, last, state.record.rules.wickets_to_fall)
                }
                _ => crate::core::match_state::MatchResult {
                    winner: None,
                    margin: crate::core::match_state::WinMargin::Tie,
                },
            };
            lifecycle::complete_match(&mut state.record, result)?;
            events.push(EngineEvent::MatchCompleted {
                record: state.record.clone(),
            });
        } else if state.record.stage == MatchStage::Live {
            lifecycle::enter_innings_break(&mut state.record)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Ball Disposition
// ============================================================================

/// Where a submitted ball stands after the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallDisposition {
    /// Awaiting the sibling scorer's event.
    Pending,
    /// Committed canonically.
    Committed {
        /// The canonical ball identifier.
        ball_id: BallId,
    },
    /// Consensus reached but held behind an earlier open dispute.
    Held {
        /// The held coordinate.
        number: BallNumber,
    },
    /// A dispute was opened.
    Disputed {
        /// The dispute identifier.
        dispute_id: DisputeId,
    },
}

/// Shifts an unsigned total by the delta between two contributions.
const fn shift(total: u32, old: u32, new: u32) -> u32 {
    total.saturating_sub(old).saturating_add(new)
}

/// Expected coordinate for the next fresh claim in the current over.
///
/// Starts at the committed cursor and steps over every coordinate whose
/// uncommitted claims record a legal delivery (pending claims, open
/// disputes, and held commits all advance the frontier); an uncommitted
/// illegal delivery keeps the frontier on its coordinate for the re-bowl.
fn expected_claim_coordinate(state: &MatchState, innings: &InningsState) -> BallNumber {
    let over = innings.current_over;
    let mut ball_in_over = innings.ball_in_over.saturating_add(1);
    loop {
        let coordinate = BallNumber::new(over, ball_in_over);
        if ball_in_over == u8::MAX || !steps_over(state, coordinate) {
            return coordinate;
        }
        ball_in_over += 1;
    }
}

/// Returns true when an uncommitted coordinate already carries a legal
/// claim, so the next fresh claim targets the following coordinate.
fn steps_over(state: &MatchState, coordinate: BallNumber) -> bool {
    if let Some(record) = state.consensus.held.get(&coordinate) {
        return record.outcome.is_legal;
    }
    if let Some(claims) = state.consensus.pending.get(&coordinate) {
        if !claims.is_empty() {
            return claims.iter().any(|claim| claim.outcome.is_legal);
        }
    }
    state
        .disputes
        .iter()
        .filter(|dispute| {
            dispute.status == DisputeStatus::Open && dispute.number == coordinate
        })
        .any(|dispute| dispute.claims.iter().any(|claim| claim.outcome.is_legal))
}
