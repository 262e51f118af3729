// crates/crease-core/src/core/ball.rs
// ============================================================================
// Module: Ball and Wicket Model
// Description: Logical ball coordinates, delivery outcomes, and dismissals.
// Purpose: Define the atomic unit of cricket scoring shared by all engines.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A logical ball is the `(over, ball_in_over)` coordinate a delivery is
//! recorded against, regardless of legality; a wide at 1.3 and its re-bowl
//! share the coordinate. [`BallOutcome`] is the scorer-claimed result that
//! consensus compares field by field, and [`CanonicalBall`] is the immutable
//! record committed to the projection once consensus is reached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BallId;
use crate::core::identifiers::ConsensusId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::OverId;
use crate::core::identifiers::PlayerId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Logical Ball Coordinate
// ============================================================================

/// Logical ball coordinate `over.ball_in_over`, e.g. `15.4`.
///
/// # Invariants
/// - `over` is 1-based; `ball_in_over` is 1-based within the over.
/// - Ordering is over-major, then ball-in-over.
/// - Serializes as the decimal wire string (`"15.4"`), which also makes the
///   coordinate usable as a JSON map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallNumber {
    /// Over number (1-based).
    pub over: u32,
    /// Ball within the over (1-based).
    pub ball_in_over: u8,
}

impl Serialize for BallNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BallNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl BallNumber {
    /// Creates a ball coordinate.
    #[must_use]
    pub const fn new(over: u32, ball_in_over: u8) -> Self {
        Self {
            over,
            ball_in_over,
        }
    }
}

impl fmt::Display for BallNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.over, self.ball_in_over)
    }
}

/// Error parsing a decimal ball coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallNumberParseError;

impl fmt::Display for BallNumberParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ball number must be decimal like 15.4")
    }
}

impl std::error::Error for BallNumberParseError {}

impl FromStr for BallNumber {
    type Err = BallNumberParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (over, ball) = value.split_once('.').ok_or(BallNumberParseError)?;
        let over: u32 = over.parse().map_err(|_| BallNumberParseError)?;
        let ball_in_over: u8 = ball.parse().map_err(|_| BallNumberParseError)?;
        if over == 0 || ball_in_over == 0 {
            return Err(BallNumberParseError);
        }
        Ok(Self {
            over,
            ball_in_over,
        })
    }
}

// ============================================================================
// SECTION: Delivery Enums
// ============================================================================

/// Extra classification for a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtraKind {
    /// No extra; a plain delivery.
    #[default]
    None,
    /// Wide: illegal, one penalty run plus any additional runs.
    Wide,
    /// No-ball: illegal, one penalty run; bat runs still credit the batsman.
    NoBall,
    /// Bye: legal delivery, runs to extras.
    Bye,
    /// Leg bye: legal delivery, runs to extras.
    LegBye,
    /// Penalty runs awarded to the batting side.
    Penalty,
}

impl ExtraKind {
    /// Returns true when the delivery counts as a legal ball of the over.
    #[must_use]
    pub const fn counts_as_legal(self) -> bool {
        matches!(self, Self::None | Self::Bye | Self::LegBye)
    }

    /// Stable wire name of the extra kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Wide => "wide",
            Self::NoBall => "no_ball",
            Self::Bye => "bye",
            Self::LegBye => "leg_bye",
            Self::Penalty => "penalty",
        }
    }
}

impl fmt::Display for ExtraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boundary classification when the ball reaches the rope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Ball crossed the rope after touching the ground.
    Four,
    /// Ball cleared the rope on the full.
    Six,
}

/// Dismissal classification for a wicket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalKind {
    /// Bowled.
    Bowled,
    /// Caught by a fielder or the keeper.
    Caught,
    /// Leg before wicket.
    Lbw,
    /// Run out; no bowler credit.
    RunOut,
    /// Stumped by the keeper.
    Stumped,
    /// Hit wicket.
    HitWicket,
    /// Retired out.
    RetiredOut,
    /// Obstructing the field.
    ObstructingField,
    /// Timed out.
    TimedOut,
    /// Handled the ball.
    Handled,
    /// Hit the ball twice.
    HitBallTwice,
}

impl DismissalKind {
    /// Returns true when the dismissal credits the bowler.
    #[must_use]
    pub const fn credits_bowler(self) -> bool {
        matches!(
            self,
            Self::Bowled | Self::Caught | Self::Lbw | Self::Stumped | Self::HitWicket
        )
    }

    /// Returns true when the dismissal requires the keeper behind the stumps.
    #[must_use]
    pub const fn requires_keeper(self) -> bool {
        matches!(self, Self::Stumped)
    }

    /// Stable wire name of the dismissal kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bowled => "bowled",
            Self::Caught => "caught",
            Self::Lbw => "lbw",
            Self::RunOut => "run_out",
            Self::Stumped => "stumped",
            Self::HitWicket => "hit_wicket",
            Self::RetiredOut => "retired_out",
            Self::ObstructingField => "obstructing_field",
            Self::TimedOut => "timed_out",
            Self::Handled => "handled",
            Self::HitBallTwice => "hit_ball_twice",
        }
    }
}

impl fmt::Display for DismissalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Wicket Detail
// ============================================================================

/// Scorer-claimed dismissal detail attached to a delivery.
///
/// # Invariants
/// - `bowler_credit` is required exactly when the kind credits the bowler.
/// - `fielders` lists catcher/keeper first, relay fielder second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WicketDetail {
    /// Dismissal classification.
    pub dismissal: DismissalKind,
    /// Batsman dismissed.
    pub batsman_out: PlayerId,
    /// Bowler credited with the wicket, when the kind credits one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowler_credit: Option<PlayerId>,
    /// Fielders involved in the dismissal (at most two).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fielders: Vec<PlayerId>,
}

// ============================================================================
// SECTION: Ball Outcome
// ============================================================================

/// Scorer-claimed outcome of one delivery.
///
/// These are the fields the consensus engine compares between scorers; two
/// claims agree when every consensus-relevant field matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallOutcome {
    /// Runs scored off the bat.
    pub runs_off_bat: u32,
    /// Whether the ball reached the boundary.
    pub is_boundary: bool,
    /// Boundary classification when `is_boundary` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_kind: Option<BoundaryKind>,
    /// Whether the delivery is legal.
    pub is_legal: bool,
    /// Extra classification.
    pub extra_kind: ExtraKind,
    /// Extra runs beyond the automatic penalty, per the extras table.
    pub extra_runs: u32,
    /// Whether a wicket fell on this delivery.
    pub is_wicket: bool,
    /// Dismissal detail, present exactly when `is_wicket` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wicket: Option<WicketDetail>,
}

impl BallOutcome {
    /// Dot-ball outcome with no runs, no extras, and no wicket.
    #[must_use]
    pub const fn dot() -> Self {
        Self {
            runs_off_bat: 0,
            is_boundary: false,
            boundary_kind: None,
            is_legal: true,
            extra_kind: ExtraKind::None,
            extra_runs: 0,
            is_wicket: false,
            wicket: None,
        }
    }

    /// Returns true when another claim agrees on all consensus-relevant fields.
    ///
    /// Agreement covers runs off the bat, extra kind and runs, wicket
    /// presence, and (when a wicket fell) the dismissal kind and batsman out.
    #[must_use]
    pub fn agrees_with(&self, other: &Self) -> bool {
        if self.runs_off_bat != other.runs_off_bat
            || self.extra_kind != other.extra_kind
            || self.extra_runs != other.extra_runs
            || self.is_wicket != other.is_wicket
        {
            return false;
        }
        match (&self.wicket, &other.wicket) {
            (None, None) => true,
            (Some(mine), Some(theirs)) => {
                mine.dismissal == theirs.dismissal && mine.batsman_out == theirs.batsman_out
            }
            _ => false,
        }
    }

    /// Scoreboard symbol for this delivery (`W`, `wd`, `nb`, `4`, `6`, digits).
    #[must_use]
    pub fn symbol(&self) -> String {
        if self.is_wicket {
            return String::from("W");
        }
        match self.extra_kind {
            ExtraKind::Wide => return String::from("wd"),
            ExtraKind::NoBall => return String::from("nb"),
            _ => {}
        }
        if self.is_boundary {
            match self.boundary_kind {
                Some(BoundaryKind::Six) => return String::from("6"),
                Some(BoundaryKind::Four) => return String::from("4"),
                None => {}
            }
        }
        self.runs_off_bat.to_string()
    }
}

// ============================================================================
// SECTION: Canonical Ball
// ============================================================================

/// Wicket record linked one-to-one with a canonical ball.
///
/// # Invariants
/// - `wicket_number` runs 1 to `rules.wickets_to_fall` within an innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WicketRecord {
    /// Dismissal detail as resolved by consensus.
    pub detail: WicketDetail,
    /// Ordinal of this wicket within the innings.
    pub wicket_number: u8,
    /// Team score when the wicket fell.
    pub team_score_at_wicket: u32,
    /// Runs added by the broken partnership.
    pub partnership_runs: u32,
}

/// The single ball record committed to the projection after consensus.
///
/// # Invariants
/// - Immutable once committed; corrections append a compensating ball that
///   references the original through `compensates`.
/// - Exactly one wicket record exists iff `outcome.is_wicket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBall {
    /// Canonical ball identifier.
    pub ball_id: BallId,
    /// Owning innings.
    pub innings_id: InningsId,
    /// Owning over.
    pub over_id: OverId,
    /// Logical ball coordinate.
    pub number: BallNumber,
    /// Bowler of the delivery.
    pub bowler: PlayerId,
    /// Batsman on strike.
    pub striker: PlayerId,
    /// Batsman at the non-striker's end, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker: Option<PlayerId>,
    /// Resolved delivery outcome.
    pub outcome: BallOutcome,
    /// Wicket record, present exactly when the outcome is a wicket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wicket: Option<WicketRecord>,
    /// Consensus record that committed this ball.
    pub consensus_id: ConsensusId,
    /// Confidence of the committing consensus, in `[0, 1]`.
    pub confidence: f64,
    /// Optional shot metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_kind: Option<String>,
    /// Optional fielding-position metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielding_position: Option<String>,
    /// Instant the delivery was bowled.
    pub bowled_at: Timestamp,
    /// Earlier canonical ball this record compensates, for corrections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensates: Option<BallId>,
}
