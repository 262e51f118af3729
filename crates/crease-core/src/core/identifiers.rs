// crates/crease-core/src/core/identifiers.rs
// ============================================================================
// Module: Crease Identifiers
// Description: Canonical opaque identifiers for matches, players, and events.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Crease.
//! Identifiers are opaque 128-bit tokens that serialize as 36-character
//! hyphenated lowercase strings on the wire. The core never interprets
//! identifier contents; generation happens at the API boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Defines a UUID-backed opaque identifier newtype with stable wire form.
macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Invariants
        /// - Opaque 128-bit token; serialized as 36-char hyphenated lowercase.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generates a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.as_hyphenated().fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value).map(Self)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

opaque_id! {
    /// Match identifier.
    MatchId
}

opaque_id! {
    /// Team identifier.
    TeamId
}

opaque_id! {
    /// Player identifier (a team member who may bat, bowl, or field).
    PlayerId
}

opaque_id! {
    /// Verified caller identity supplied by the authentication boundary.
    UserId
}

opaque_id! {
    /// Innings identifier within a match.
    InningsId
}

opaque_id! {
    /// Over identifier within an innings.
    OverId
}

opaque_id! {
    /// Canonical ball identifier.
    BallId
}

opaque_id! {
    /// Raw scoring event identifier.
    EventId
}

opaque_id! {
    /// Dispute identifier.
    DisputeId
}

opaque_id! {
    /// Consensus record identifier.
    ConsensusId
}

opaque_id! {
    /// Correlation identifier threaded through commands, audit, and errors.
    CorrelationId
}
