// crates/crease-core/src/core/time.rs
// ============================================================================
// Module: Crease Time Model
// Description: Canonical UTC timestamps for events, balls, and disputes.
// Purpose: Provide deterministic, replayable time values across Crease records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Crease records carry explicit UTC instants with millisecond precision.
//! The core engine never reads wall-clock time directly; timestamps enter
//! through commands and are truncated to milliseconds at construction so
//! replayed logs hash identically. Wire form is RFC 3339 with a trailing `Z`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC instant with millisecond precision.
///
/// # Invariants
/// - Always UTC; sub-millisecond components are truncated at construction.
/// - Values are explicitly provided by callers; the core never reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Creates a timestamp from an instant, truncating to millisecond precision.
    #[must_use]
    pub fn from_instant(instant: OffsetDateTime) -> Self {
        let millis = instant.unix_timestamp_nanos() / 1_000_000;
        Self::from_unix_millis_saturating(millis)
    }

    /// Creates a timestamp from unix epoch milliseconds, clamping out-of-range values.
    #[must_use]
    pub fn from_unix_millis_saturating(millis: i128) -> Self {
        let nanos = millis.saturating_mul(1_000_000);
        match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            Ok(instant) => Self(instant),
            Err(_) => Self(OffsetDateTime::UNIX_EPOCH),
        }
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(&self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000_000
    }

    /// Returns the underlying instant.
    #[must_use]
    pub const fn as_instant(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the absolute distance to another timestamp.
    #[must_use]
    pub fn abs_distance(&self, other: &Self) -> Duration {
        let delta = self.0 - other.0;
        delta.abs()
    }

    /// Renders the timestamp in RFC 3339 form with a trailing `Z`.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
