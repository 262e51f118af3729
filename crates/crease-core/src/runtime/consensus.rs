// crates/crease-core/src/runtime/consensus.rs
// ============================================================================
// Module: Consensus Engine
// Description: Dual-scorer matching, dispute lifecycle, and held commits.
// Purpose: Decide which scorer claims become canonical balls and in what order.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each logical ball expects one claim per active scorer. Claims are matched
//! inside a configurable window; an umpire-side claim overrides, agreeing
//! opposite-side claims commit with full confidence, disagreeing claims open
//! a dispute, and a lone claim past the window is either accepted under the
//! single-scorer policy or parked in a `missing` dispute. Commits for balls
//! after an open dispute are held and released strictly in ball order when
//! the dispute resolves. Raw ingestion is never blocked by a dispute.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ball::BallNumber;
use crate::core::ball::BallOutcome;
use crate::core::dispute::ConsensusMethod;
use crate::core::dispute::ConsensusRecord;
use crate::core::dispute::Dispute;
use crate::core::dispute::DisputeClaim;
use crate::core::dispute::DisputeKind;
use crate::core::dispute::DisputeStatus;
use crate::core::event::ScorerSide;
use crate::core::identifiers::ConsensusId;
use crate::core::identifiers::DisputeId;
use crate::core::identifiers::InningsId;
use crate::core::identifiers::MatchId;
use crate::core::identifiers::UserId;
use crate::core::hashing::derive_uuid;
use crate::core::match_state::ConsensusState;
use crate::core::match_state::PendingClaim;
use crate::core::rules::MatchingWindow;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Outcome of considering a new claim for a logical ball.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimDecision {
    /// Consensus reached; the record is ready to commit (or hold).
    Reached(ConsensusRecord),
    /// Claims disagree; a dispute was assembled.
    Disputed(Dispute),
    /// First claim for the ball; awaiting a sibling.
    Pending,
    /// The same scorer already claimed the identical outcome for this ball.
    Duplicate,
}

/// Parameters identifying the ball a claim addresses.
#[derive(Debug, Clone, Copy)]
pub struct ClaimScope {
    /// Owning match.
    pub match_id: MatchId,
    /// Owning innings.
    pub innings_id: InningsId,
    /// Logical ball coordinate.
    pub number: BallNumber,
}

// ============================================================================
// SECTION: Claim Consideration
// ============================================================================

/// Considers a freshly appended scorer claim for a logical ball.
///
/// Decision order, first match wins:
/// 1. an umpire-side claim overrides all scorer claims;
/// 2. two opposite-side claims that agree commit as a scorer match;
/// 3. two opposite-side claims that disagree open a dispute;
/// 4. otherwise the claim is parked pending a sibling.
///
/// The pending set is mutated: a reached decision consumes the ball's
/// pending claims, a dispute leaves them consumed into the dispute record,
/// and a pending decision parks the claim.
pub fn consider_claim(
    consensus: &mut ConsensusState,
    scope: ClaimScope,
    claim: PendingClaim,
    window: MatchingWindow,
) -> ClaimDecision {
    let pending = consensus.pending.entry(scope.number).or_default();

    // Idempotent resubmission from the same scorer.
    if let Some(existing) = pending.iter_mut().find(|entry| entry.scorer_id == claim.scorer_id) {
        if existing.outcome == claim.outcome {
            return ClaimDecision::Duplicate;
        }
        // A revised claim from the same scorer replaces the earlier one.
        *existing = claim.clone();
    } else {
        pending.push(claim.clone());
    }

    // Rule 1: umpire override.
    if claim.scorer_side == ScorerSide::Umpire {
        let claims = consensus.pending.remove(&scope.number).unwrap_or_default();
        let record = build_record(
            scope,
            &claims,
            ConsensusMethod::UmpireOverride,
            claim.outcome.clone(),
            Some(claim.scorer_id),
            claim.recorded_at,
        );
        return ClaimDecision::Reached(record);
    }

    // Rules 2 and 3 need a sibling from a different scorer inside the window.
    let Some(pending) = consensus.pending.get(&scope.number) else {
        return ClaimDecision::Pending;
    };
    let sibling = pending.iter().find(|entry| {
        entry.scorer_id != claim.scorer_id
            && entry.scorer_side != claim.scorer_side
            && within_window(entry, &claim, window)
    });
    let Some(sibling) = sibling.cloned() else {
        return ClaimDecision::Pending;
    };

    if sibling.outcome.agrees_with(&claim.outcome) {
        let claims = consensus.pending.remove(&scope.number).unwrap_or_default();
        let record = build_record(
            scope,
            &claims,
            ConsensusMethod::ScorerMatch,
            claim.outcome.clone(),
            None,
            claim.recorded_at,
        );
        return ClaimDecision::Reached(record);
    }

    let claims = consensus.pending.remove(&scope.number).unwrap_or_default();
    let dispute = build_dispute(scope, &claims, &sibling.outcome, &claim.outcome, claim.recorded_at);
    ClaimDecision::Disputed(dispute)
}

/// Returns true when two claims fall inside the matching window.
fn within_window(earlier: &PendingClaim, later: &PendingClaim, window: MatchingWindow) -> bool {
    let age_ms = later.recorded_at.abs_distance(&earlier.recorded_at).whole_milliseconds();
    if age_ms.unsigned_abs() > u128::from(window.max_age_ms) {
        return false;
    }
    let distance = later.sequence.abs_diff(earlier.sequence);
    distance <= u64::from(window.max_events)
}

// ============================================================================
// SECTION: Window Expiry
// ============================================================================

/// Outcome of sweeping expired pending claims.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpirySweep {
    /// Lone claims accepted under the single-scorer policy.
    pub accepted: Vec<ConsensusRecord>,
    /// Lone claims parked in `missing` disputes (policy inactive).
    pub missing: Vec<Dispute>,
}

/// Sweeps pending claims whose matching window has expired.
///
/// With the single-scorer policy active a lone claim is accepted at half
/// confidence; otherwise a `missing` dispute is opened so an official can
/// settle the ball manually.
pub fn sweep_expired(
    consensus: &mut ConsensusState,
    match_id: MatchId,
    now: Timestamp,
    window: MatchingWindow,
    single_scorer_policy: bool,
) -> ExpirySweep {
    let mut sweep = ExpirySweep::default();
    let expired: Vec<BallNumber> = consensus
        .pending
        .iter()
        .filter(|(_, claims)| {
            claims.iter().all(|claim| {
                let age_ms = now.abs_distance(&claim.recorded_at).whole_milliseconds();
                age_ms.unsigned_abs() > u128::from(window.max_age_ms)
            })
        })
        .map(|(number, _)| *number)
        .collect();

    for number in expired {
        let Some(claims) = consensus.pending.remove(&number) else {
            continue;
        };
        let Some(first) = claims.first() else {
            continue;
        };
        let scope = ClaimScope {
            match_id,
            innings_id: first.innings_id,
            number,
        };
        if single_scorer_policy {
            let record = build_record(
                scope,
                &claims,
                ConsensusMethod::SingleScorerAccepted,
                first.outcome.clone(),
                None,
                now,
            );
            sweep.accepted.push(record);
        } else {
            let event_part = first.event_id.to_string();
            let match_part = match_id.to_string();
            let number_part = number.to_string();
            let dispute = Dispute {
                dispute_id: DisputeId::from_uuid(derive_uuid(
                    "dispute-missing",
                    &[&match_part, &number_part, &event_part],
                )),
                match_id,
                innings_id: first.innings_id,
                number,
                kind: DisputeKind::Missing,
                status: DisputeStatus::Open,
                claims: claims
                    .iter()
                    .map(|claim| DisputeClaim {
                        event_id: claim.event_id,
                        scorer_id: claim.scorer_id,
                        outcome: claim.outcome.clone(),
                    })
                    .collect(),
                difference_summary: String::from(
                    "no matching event from the opposite scorer inside the window",
                ),
                opened_at: now,
                resolved_at: None,
                resolver_id: None,
                final_outcome: None,
                latency_ms: None,
            };
            sweep.missing.push(dispute);
        }
    }
    sweep
}

// ============================================================================
// SECTION: Dispute Resolution
// ============================================================================

/// Builds the manual-resolution consensus for a settled dispute.
///
/// The dispute record itself is closed by the engine; this only assembles
/// the consensus decision that commits the final payload.
#[must_use]
pub fn resolve_dispute(
    dispute: &Dispute,
    final_outcome: BallOutcome,
    resolver: UserId,
    resolved_at: Timestamp,
) -> ConsensusRecord {
    let scope = ClaimScope {
        match_id: dispute.match_id,
        innings_id: dispute.innings_id,
        number: dispute.number,
    };
    let claims: Vec<PendingClaim> = Vec::new();
    let mut record = build_record(
        scope,
        &claims,
        ConsensusMethod::ManualResolution,
        final_outcome,
        Some(resolver),
        resolved_at,
    );
    record.event_ids = dispute.claims.iter().map(|claim| claim.event_id).collect();
    record
}

// ============================================================================
// SECTION: Held Commits
// ============================================================================

/// Drains held consensus records that are now in front of every open dispute.
///
/// Returns the records in strict logical ball order; the caller applies each
/// to the projection and lists them in a reconciliation frame.
#[must_use]
pub fn release_held(
    consensus: &mut ConsensusState,
    earliest_open_dispute: Option<BallNumber>,
) -> Vec<ConsensusRecord> {
    let mut released = Vec::new();
    loop {
        let Some((&number, _)) = consensus.held.first_key_value() else {
            break;
        };
        if let Some(blocked_from) = earliest_open_dispute {
            if number > blocked_from {
                break;
            }
        }
        if let Some(record) = consensus.held.remove(&number) {
            released.push(record);
        }
    }
    released
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Assembles a consensus record from the claims it unifies.
///
/// The record identifier is derived from the unified event identifiers so a
/// log replay reproduces it exactly.
fn build_record(
    scope: ClaimScope,
    claims: &[PendingClaim],
    method: ConsensusMethod,
    outcome: BallOutcome,
    authority_id: Option<UserId>,
    decided_at: Timestamp,
) -> ConsensusRecord {
    let event_ids: Vec<_> = claims.iter().map(|claim| claim.event_id).collect();
    let id_parts: Vec<String> = event_ids.iter().map(ToString::to_string).collect();
    let mut parts: Vec<&str> = vec![];
    let match_part = scope.match_id.to_string();
    let number_part = scope.number.to_string();
    parts.push(&match_part);
    parts.push(&number_part);
    parts.extend(id_parts.iter().map(String::as_str));
    ConsensusRecord {
        consensus_id: ConsensusId::from_uuid(derive_uuid("consensus", &parts)),
        match_id: scope.match_id,
        innings_id: scope.innings_id,
        number: scope.number,
        event_ids,
        method,
        confidence: method.confidence(),
        outcome,
        applied_to_ball: false,
        authority_id,
        decided_at,
    }
}

/// Assembles a dispute from disagreeing claims with a difference summary.
fn build_dispute(
    scope: ClaimScope,
    claims: &[PendingClaim],
    left: &BallOutcome,
    right: &BallOutcome,
    opened_at: Timestamp,
) -> Dispute {
    let id_parts: Vec<String> = claims.iter().map(|claim| claim.event_id.to_string()).collect();
    let match_part = scope.match_id.to_string();
    let number_part = scope.number.to_string();
    let mut parts: Vec<&str> = vec![&match_part, &number_part];
    parts.extend(id_parts.iter().map(String::as_str));
    Dispute {
        dispute_id: DisputeId::from_uuid(derive_uuid("dispute", &parts)),
        match_id: scope.match_id,
        innings_id: scope.innings_id,
        number: scope.number,
        kind: classify_disagreement(left, right),
        status: DisputeStatus::Open,
        claims: claims
            .iter()
            .map(|claim| DisputeClaim {
                event_id: claim.event_id,
                scorer_id: claim.scorer_id,
                outcome: claim.outcome.clone(),
            })
            .collect(),
        difference_summary: difference_summary(left, right),
        opened_at,
        resolved_at: None,
        resolver_id: None,
        final_outcome: None,
        latency_ms: None,
    }
}

/// Classifies which field family the scorers disagree on.
#[must_use]
pub fn classify_disagreement(left: &BallOutcome, right: &BallOutcome) -> DisputeKind {
    let wicket_differs = left.is_wicket != right.is_wicket
        || match (&left.wicket, &right.wicket) {
            (Some(mine), Some(theirs)) => {
                mine.dismissal != theirs.dismissal || mine.batsman_out != theirs.batsman_out
            }
            (None, None) => false,
            _ => true,
        };
    if wicket_differs {
        return DisputeKind::WicketDiffer;
    }
    if left.extra_kind != right.extra_kind {
        return DisputeKind::ExtraKindDiffer;
    }
    DisputeKind::RunsDiffer
}

/// Builds a human-readable summary of the disagreeing fields.
fn difference_summary(left: &BallOutcome, right: &BallOutcome) -> String {
    let mut parts = Vec::new();
    if left.runs_off_bat != right.runs_off_bat {
        parts.push(format!("runs_off_bat {} vs {}", left.runs_off_bat, right.runs_off_bat));
    }
    if left.extra_kind != right.extra_kind {
        parts.push(format!("extra_kind {} vs {}", left.extra_kind, right.extra_kind));
    }
    if left.extra_runs != right.extra_runs {
        parts.push(format!("extra_runs {} vs {}", left.extra_runs, right.extra_runs));
    }
    if left.is_wicket != right.is_wicket {
        parts.push(format!("is_wicket {} vs {}", left.is_wicket, right.is_wicket));
    }
    if parts.is_empty() {
        parts.push(String::from("wicket detail differs"));
    }
    parts.join("; ")
}
