// crates/crease-core/tests/store.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Tests for the in-memory score store implementation.
// ============================================================================
//! ## Overview
//! Ensures the in-memory store round-trips aggregates, enforces dense
//! sequence numbers on commit, and reads event ranges in order.

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
use crease_core::EventStore;
use crease_core::ScoreStore;
use crease_core::StoreError;

/// Saving and loading the aggregate round-trips.
#[test]
fn aggregate_round_trips_through_the_store() {
    let fixture = Fixture::new();
    let state = fixture.state();
    let loaded = fixture.engine.store().load(fixture.match_id).unwrap().unwrap();
    assert_eq!(state, loaded);
}

/// Loading an unknown match returns none.
#[test]
fn missing_match_loads_none() {
    let fixture = Fixture::new();
    let missing = crease_core::MatchId::generate();
    assert!(fixture.engine.store().load(missing).unwrap().is_none());
}

/// Events read back densely ordered, and ranges slice by sequence.
#[test]
fn event_ranges_read_in_sequence_order() {
    let fixture = Fixture::new();
    fixture.go_live();
    let innings_id = fixture.open_innings(fixture.team_a);
    fixture.set_batsmen(innings_id, fixture.players_a[0], Some(fixture.players_a[1]));
    let over_id = fixture.open_over(innings_id, 1, fixture.players_b[10]);
    for index in 1..=3u8 {
        let submission = fixture.submission(
            innings_id,
            over_id,
            ball(1, index),
            fixture.players_b[10],
            fixture.players_a[0],
            fixture.players_a[1],
            runs(0),
        );
        fixture.both_submit(&submission);
    }

    let all = fixture.engine.store().read_range(fixture.match_id, 1, u64::MAX).unwrap();
    for (index, event) in all.iter().enumerate() {
        assert_eq!(event.sequence, u64::try_from(index).unwrap() + 1);
    }

    let slice = fixture.engine.store().read_range(fixture.match_id, 4, 6).unwrap();
    assert_eq!(slice.len(), 3);
    assert_eq!(slice[0].sequence, 4);
    assert_eq!(slice[2].sequence, 6);
}

/// A commit with a sequence gap is rejected as a conflict.
#[test]
fn gapped_commit_is_rejected() {
    let fixture = Fixture::new();
    fixture.go_live();
    fixture.open_innings(fixture.team_a);
    let mut state = fixture.state();
    let events = fixture.engine.store().read_range(fixture.match_id, 1, u64::MAX).unwrap();
    let mut forged = events[0].clone();
    forged.sequence = u64::try_from(events.len()).unwrap() + 5;
    state.chain_tail.last_sequence = forged.sequence;
    let result = fixture.engine.store().commit(&[forged], &state);
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}
