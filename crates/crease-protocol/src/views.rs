// crates/crease-protocol/src/views.rs
// ============================================================================
// Module: Query Views
// Description: Response shapes served by the command and query APIs.
// Purpose: Define stable wire views over derived match state.
// Dependencies: crease-core, serde
// ============================================================================

//! ## Overview
//! Views are the read shapes the APIs serve. They are built from the core
//! aggregate and never expose engine internals; ratios with zero
//! denominators serialize as absent rather than zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crease_core::BallNumber;
use crease_core::BallOutcome;
use crease_core::CanonicalBall;
use crease_core::Dispute;
use crease_core::DisputeKind;
use crease_core::DisputeStatus;
use crease_core::InningsProjection;
use crease_core::MatchRecord;
use crease_core::MatchResult;
use crease_core::MatchStage;
use crease_core::MatchState;
use crease_core::RawEvent;
use crease_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Match Views
// ============================================================================

/// View of a match record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    /// Match identifier.
    pub match_id: crease_core::MatchId,
    /// First party (home side).
    pub team_a: crease_core::TeamId,
    /// Second party (away side).
    pub team_b: crease_core::TeamId,
    /// Lifecycle stage.
    pub stage: MatchStage,
    /// Rules configuration.
    pub rules: crease_core::MatchRules,
    /// Toss outcome, once conducted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toss: Option<crease_core::TossOutcome>,
    /// Final result, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    /// Instant the match was created.
    pub created_at: Timestamp,
}

impl From<&MatchRecord> for MatchView {
    fn from(record: &MatchRecord) -> Self {
        Self {
            match_id: record.match_id,
            team_a: record.team_a,
            team_b: record.team_b,
            stage: record.stage,
            rules: record.rules.clone(),
            toss: record.toss,
            result: record.result,
            created_at: record.created_at,
        }
    }
}

// ============================================================================
// SECTION: Innings Views
// ============================================================================

/// Batting line for one batsman.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatsmanView {
    /// Batsman identity.
    pub player_id: crease_core::PlayerId,
    /// Runs scored off the bat.
    pub runs: u32,
    /// Legal deliveries faced.
    pub balls_faced: u32,
    /// Fours hit.
    pub fours: u32,
    /// Sixes hit.
    pub sixes: u32,
    /// Strike rate, absent before the first ball faced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_rate: Option<f64>,
    /// Dismissal, once out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<crease_core::DismissalKind>,
}

/// Bowling line for one bowler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlerView {
    /// Bowler identity.
    pub player_id: crease_core::PlayerId,
    /// Legal deliveries bowled.
    pub balls_bowled: u32,
    /// Runs conceded.
    pub runs_conceded: u32,
    /// Wickets credited.
    pub wickets: u32,
    /// Maiden overs completed.
    pub maidens: u32,
    /// Economy, absent before the first ball bowled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<f64>,
}

/// View of one over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverView {
    /// Over identifier.
    pub over_id: crease_core::OverId,
    /// Owning innings.
    pub innings_id: crease_core::InningsId,
    /// Over number (1-based).
    pub over_number: u32,
    /// Bowler of the over.
    pub bowler_id: crease_core::PlayerId,
    /// Legal deliveries bowled.
    pub legal_deliveries: u8,
    /// Runs conceded.
    pub runs_conceded: u32,
    /// Wickets taken.
    pub wickets_taken: u32,
    /// Extras conceded.
    pub extras_in_over: u32,
    /// Ball symbols in delivery order.
    pub ball_sequence: Vec<String>,
    /// Whether the over is a maiden.
    pub is_maiden: bool,
    /// Whether the over has completed.
    pub is_completed: bool,
}

impl From<&crease_core::OverState> for OverView {
    fn from(over: &crease_core::OverState) -> Self {
        Self {
            over_id: over.over_id,
            innings_id: over.innings_id,
            over_number: over.over_number,
            bowler_id: over.bowler,
            legal_deliveries: over.legal_deliveries,
            runs_conceded: over.runs_conceded,
            wickets_taken: u32::from(over.wickets_taken),
            extras_in_over: over.extras_in_over,
            ball_sequence: over.symbols.clone(),
            is_maiden: over.maiden,
            is_completed: over.completed,
        }
    }
}

/// View of one innings with its derived aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsView {
    /// Innings identifier.
    pub innings_id: crease_core::InningsId,
    /// Owning match.
    pub match_id: crease_core::MatchId,
    /// Innings ordinal (1-based).
    pub innings_number: u8,
    /// Batting side.
    pub batting_team_id: crease_core::TeamId,
    /// Bowling side.
    pub bowling_team_id: crease_core::TeamId,
    /// Total runs including extras.
    pub total_runs: u32,
    /// Wickets fallen.
    pub wickets_fallen: u8,
    /// Extras conceded.
    pub extras: u32,
    /// Scoreboard string, e.g. `45/3`.
    pub score: String,
    /// Overs string, e.g. `12.4`.
    pub overs: String,
    /// Current run rate, absent before the first legal ball.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_rate: Option<f64>,
    /// Runs still required in a chase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_required: Option<u32>,
    /// Chase target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Batsman on strike.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub striker: Option<BatsmanView>,
    /// Batsman off strike.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker: Option<BatsmanView>,
    /// Current bowler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bowler: Option<BowlerView>,
    /// Fall-of-wicket sequence.
    pub fall_of_wickets: Vec<crease_core::FallOfWicket>,
    /// Whether the innings has completed.
    pub is_completed: bool,
    /// Whether the side was bowled out.
    pub all_out: bool,
    /// Whether the innings was declared closed.
    pub declared: bool,
}

impl InningsView {
    /// Builds the view from an innings projection under the match rules.
    #[must_use]
    pub fn from_projection(innings: &InningsProjection, balls_per_over: u8) -> Self {
        let state = &innings.state;
        let batsman_view = |player: crease_core::PlayerId| {
            innings.batsmen.get(&player).map(|aggregate| BatsmanView {
                player_id: aggregate.player_id,
                runs: aggregate.runs,
                balls_faced: aggregate.balls_faced,
                fours: aggregate.fours,
                sixes: aggregate.sixes,
                strike_rate: aggregate.strike_rate(),
                out: aggregate.out,
            })
        };
        let bowler_view = |player: crease_core::PlayerId| {
            innings.bowlers.get(&player).map(|aggregate| BowlerView {
                player_id: aggregate.player_id,
                balls_bowled: aggregate.balls_bowled,
                runs_conceded: aggregate.runs_conceded,
                wickets: aggregate.wickets,
                maidens: aggregate.maidens,
                economy: aggregate.economy(),
            })
        };
        Self {
            innings_id: state.innings_id,
            match_id: state.match_id,
            innings_number: state.innings_number,
            batting_team_id: state.batting_team,
            bowling_team_id: state.bowling_team,
            total_runs: state.total_runs,
            wickets_fallen: state.wickets_fallen,
            extras: state.extras_total,
            score: innings.score_line(),
            overs: innings.overs_line(),
            run_rate: state.run_rate(balls_per_over),
            runs_required: state.runs_required(),
            target: state.target,
            striker: state.striker.and_then(batsman_view),
            non_striker: state.non_striker.and_then(batsman_view),
            current_bowler: state.current_bowler.and_then(bowler_view),
            fall_of_wickets: innings.fall_of_wickets.clone(),
            is_completed: state.completed,
            all_out: state.all_out,
            declared: state.declared,
        }
    }
}

// ============================================================================
// SECTION: Ball and Dispute Views
// ============================================================================

/// Where a submitted ball stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallStatus {
    /// Awaiting the sibling scorer's event.
    Pending,
    /// Committed canonically.
    Committed,
    /// Held behind an earlier open dispute.
    Held,
    /// Pending consensus after a disagreement.
    Disputed,
}

/// View of a submitted or committed ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallView {
    /// Canonical ball identifier, once committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_id: Option<crease_core::BallId>,
    /// Owning innings.
    pub innings_id: crease_core::InningsId,
    /// Logical ball coordinate.
    pub ball_number: BallNumber,
    /// Submission or consensus outcome.
    pub outcome: BallOutcome,
    /// Disposition of the ball.
    pub status: BallStatus,
    /// Dispute identifier, when disputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispute_id: Option<crease_core::DisputeId>,
    /// Consensus confidence, once committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl BallView {
    /// Builds the committed view of a canonical ball.
    #[must_use]
    pub fn committed(ball: &CanonicalBall) -> Self {
        Self {
            ball_id: Some(ball.ball_id),
            innings_id: ball.innings_id,
            ball_number: ball.number,
            outcome: ball.outcome.clone(),
            status: BallStatus::Committed,
            dispute_id: None,
            confidence: Some(ball.confidence),
        }
    }
}

/// View of a dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeView {
    /// Dispute identifier.
    pub dispute_id: crease_core::DisputeId,
    /// Owning match.
    pub match_id: crease_core::MatchId,
    /// Logical ball under dispute.
    pub ball_number: BallNumber,
    /// Dispute classification.
    pub kind: DisputeKind,
    /// Lifecycle status.
    pub status: DisputeStatus,
    /// Machine-built summary of the disagreeing fields.
    pub difference_summary: String,
    /// Instant the dispute was opened.
    pub opened_at: Timestamp,
    /// Instant the dispute was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    /// Resolution latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl From<&Dispute> for DisputeView {
    fn from(dispute: &Dispute) -> Self {
        Self {
            dispute_id: dispute.dispute_id,
            match_id: dispute.match_id,
            ball_number: dispute.number,
            kind: dispute.kind,
            status: dispute.status,
            difference_summary: dispute.difference_summary.clone(),
            opened_at: dispute.opened_at,
            resolved_at: dispute.resolved_at,
            latency_ms: dispute.latency_ms,
        }
    }
}

// ============================================================================
// SECTION: Event Views
// ============================================================================

/// View of one raw event-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    /// Event identifier.
    pub event_id: crease_core::EventId,
    /// Monotonic sequence number within the match.
    pub sequence_number: u64,
    /// Scorer who recorded the event.
    pub scorer_id: crease_core::UserId,
    /// Side the scorer represents.
    pub scorer_side: crease_core::ScorerSide,
    /// Stable payload kind name.
    pub kind: String,
    /// Hash of the previous event in the chain.
    pub prior_hash: String,
    /// Chained hash of this event.
    pub event_hash: String,
    /// Instant the event was recorded.
    pub event_timestamp: Timestamp,
}

impl From<&RawEvent> for EventView {
    fn from(event: &RawEvent) -> Self {
        Self {
            event_id: event.event_id,
            sequence_number: event.sequence,
            scorer_id: event.scorer_id,
            scorer_side: event.scorer_side,
            kind: event.payload.kind_name().to_string(),
            prior_hash: event.prior_hash.clone(),
            event_hash: event.event_hash.clone(),
            event_timestamp: event.event_timestamp,
        }
    }
}

// ============================================================================
// SECTION: Snapshot View
// ============================================================================

/// Snapshot served on subscription attach and by the match query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshotView {
    /// Match record view.
    pub r#match: MatchView,
    /// Innings views in opening order.
    pub innings: Vec<InningsView>,
    /// Open disputes.
    pub open_disputes: Vec<DisputeView>,
    /// Sequence of the last committed canonical event, for replay resume.
    pub last_committed_sequence: u64,
}

impl MatchSnapshotView {
    /// Builds the snapshot from the full aggregate.
    #[must_use]
    pub fn from_state(state: &MatchState) -> Self {
        let balls_per_over = state.record.rules.balls_per_over;
        let innings = state
            .projection
            .innings_order
            .iter()
            .filter_map(|id| state.projection.innings.get(id))
            .map(|projection| InningsView::from_projection(projection, balls_per_over))
            .collect();
        let open_disputes = state
            .disputes
            .iter()
            .filter(|dispute| dispute.status == DisputeStatus::Open)
            .map(DisputeView::from)
            .collect();
        Self {
            r#match: MatchView::from(&state.record),
            innings,
            open_disputes,
            last_committed_sequence: state.projection.last_committed_sequence,
        }
    }
}
