// crates/crease-protocol/src/commands.rs
// ============================================================================
// Module: Command Bodies
// Description: Request bodies accepted by the command API.
// Purpose: Define the canonical wire shapes for scoring commands.
// Dependencies: crease-core, serde
// ============================================================================

//! ## Overview
//! Command bodies are the JSON shapes scorers and officials post to the
//! versioned command endpoints. Field names follow the wire convention
//! (camel case); identifiers are 36-character hyphenated lowercase tokens
//! and ball coordinates are decimal strings like `"15.4"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crease_core::BallNumber;
use crease_core::BallOutcome;
use crease_core::BallSubmission;
use crease_core::BoundaryKind;
use crease_core::ExtraKind;
use crease_core::InningsId;
use crease_core::MatchRules;
use crease_core::OverId;
use crease_core::PlayerId;
use crease_core::PlayingXiEntry;
use crease_core::TeamId;
use crease_core::TossElection;
use crease_core::WicketDetail;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Match Setup
// ============================================================================

/// Body for `POST /matches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreate {
    /// First party (home side).
    pub team_a: TeamId,
    /// Second party (away side).
    pub team_b: TeamId,
    /// Rules configuration; defaults to T20 when omitted.
    #[serde(default)]
    pub rules: Option<MatchRules>,
    /// Registered officials for the match.
    #[serde(default)]
    pub officials: Vec<OfficialEntry>,
}

/// One official registration inside [`MatchCreate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialEntry {
    /// Caller identity of the official.
    pub user_id: crease_core::UserId,
    /// Role: `scorer_home`, `scorer_away`, `umpire`, `official`, or `captain`.
    pub role: OfficialRoleBody,
    /// Team the official captains, for the captain role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

/// Wire role names for match officials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialRoleBody {
    /// Scorer for the home side.
    ScorerHome,
    /// Scorer for the away side.
    ScorerAway,
    /// Neutral umpire scoring with override authority.
    Umpire,
    /// Match official who may resolve disputes.
    Official,
    /// Team captain, for playing XI submission.
    Captain,
}

/// Body for `POST /matches/{id}/toss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TossRequest {
    /// Team that won the toss.
    pub toss_won_by: TeamId,
    /// What the winner elected to do.
    pub elected_to: TossElection,
}

/// Body for `POST /matches/{id}/playing-xi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingXiRequest {
    /// Team the XI belongs to.
    pub team_id: TeamId,
    /// Exactly `rules.playersPerSide` entries.
    pub entries: Vec<PlayingXiEntryBody>,
}

/// One playing XI entry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingXiEntryBody {
    /// Player identity.
    pub player_id: PlayerId,
    /// Whether the player may bat.
    #[serde(default = "default_true")]
    pub can_bat: bool,
    /// Whether the player may bowl.
    #[serde(default = "default_true")]
    pub can_bowl: bool,
    /// Whether the player keeps wicket.
    #[serde(default)]
    pub is_keeper: bool,
    /// Whether the player captains the side.
    #[serde(default)]
    pub is_captain: bool,
    /// Batting order position (1-based).
    pub batting_order: u8,
}

/// Serde default helper for opt-out boolean flags.
const fn default_true() -> bool {
    true
}

impl From<PlayingXiEntryBody> for PlayingXiEntry {
    fn from(body: PlayingXiEntryBody) -> Self {
        Self {
            player_id: body.player_id,
            can_bat: body.can_bat,
            can_bowl: body.can_bowl,
            is_keeper: body.is_keeper,
            is_captain: body.is_captain,
            batting_order: body.batting_order,
        }
    }
}

// ============================================================================
// SECTION: Innings and Overs
// ============================================================================

/// Body for `POST /innings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsCreate {
    /// Owning match.
    pub match_id: crease_core::MatchId,
    /// Side batting this innings.
    pub batting_team_id: TeamId,
}

/// Body for `POST /innings/{id}/batsmen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBatsmenRequest {
    /// Batsman taking strike.
    pub striker_id: PlayerId,
    /// Batsman at the non-striker's end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker_id: Option<PlayerId>,
}

/// Body for `POST /innings/{id}/bowler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBowlerRequest {
    /// Bowler taking the next over.
    pub bowler_id: PlayerId,
}

/// Body for `POST /overs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverCreate {
    /// Owning innings.
    pub innings_id: InningsId,
    /// Over number (1-based).
    pub over_number: u32,
    /// Bowler for the over.
    pub bowler_id: PlayerId,
}

// ============================================================================
// SECTION: Ball Submission
// ============================================================================

/// Wicket detail inside [`BallSubmit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WicketBody {
    /// Dismissal classification.
    pub dismissal_kind: crease_core::DismissalKind,
    /// Batsman dismissed.
    pub batsman_out_id: PlayerId,
    /// Bowler credited, for bowler-credited kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowler_id: Option<PlayerId>,
    /// Fielders involved (catcher or keeper first).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fielder_ids: Vec<PlayerId>,
}

impl From<WicketBody> for WicketDetail {
    fn from(body: WicketBody) -> Self {
        Self {
            dismissal: body.dismissal_kind,
            batsman_out: body.batsman_out_id,
            bowler_credit: body.bowler_id,
            fielders: body.fielder_ids,
        }
    }
}

/// Body for `POST /balls`, the primary scoring endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallSubmit {
    /// Owning innings.
    pub innings_id: InningsId,
    /// Owning over.
    pub over_id: OverId,
    /// Logical ball coordinate, decimal like `"15.4"`.
    pub ball_number: BallNumber,
    /// Bowler of the delivery.
    pub bowler_id: PlayerId,
    /// Batsman on strike.
    pub striker_id: PlayerId,
    /// Batsman at the non-striker's end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker_id: Option<PlayerId>,
    /// Runs scored off the bat.
    pub runs_off_bat: u32,
    /// Whether a wicket fell.
    #[serde(default)]
    pub is_wicket: bool,
    /// Dismissal detail, required when `is_wicket` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wicket: Option<WicketBody>,
    /// Whether the ball reached the boundary.
    #[serde(default)]
    pub is_boundary: bool,
    /// Boundary classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_kind: Option<BoundaryKind>,
    /// Whether the delivery is legal.
    pub is_legal: bool,
    /// Extra classification.
    #[serde(default)]
    pub extra_kind: ExtraKind,
    /// Extra runs beyond the automatic penalty.
    #[serde(default)]
    pub extra_runs: u32,
    /// Optional shot metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_kind: Option<String>,
    /// Optional fielding-position metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielding_position: Option<String>,
}

impl From<BallSubmit> for BallSubmission {
    fn from(body: BallSubmit) -> Self {
        Self {
            innings_id: body.innings_id,
            over_id: body.over_id,
            number: body.ball_number,
            bowler: body.bowler_id,
            striker: body.striker_id,
            non_striker: body.non_striker_id,
            outcome: BallOutcome {
                runs_off_bat: body.runs_off_bat,
                is_boundary: body.is_boundary,
                boundary_kind: body.boundary_kind,
                is_legal: body.is_legal,
                extra_kind: body.extra_kind,
                extra_runs: body.extra_runs,
                is_wicket: body.is_wicket,
                wicket: body.wicket.map(WicketDetail::from),
            },
            shot_kind: body.shot_kind,
            fielding_position: body.fielding_position,
        }
    }
}

// ============================================================================
// SECTION: Disputes
// ============================================================================

/// Body for `POST /disputes/{id}/resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeResolveRequest {
    /// Final outcome committed canonically.
    pub final_payload: BallOutcome,
    /// Advisory method label; the engine records every resolution as manual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<crease_core::ConsensusMethod>,
}

/// Body for `POST /innings/{id}/close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsCloseRequest {
    /// Whether the close is a declaration.
    #[serde(default)]
    pub declared: bool,
}
