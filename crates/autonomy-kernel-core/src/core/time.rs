// crates/autonomy-kernel-core/src/core/time.rs
// ============================================================================
// Module: Autonomy Kernel Time Model
// Description: Canonical RFC 3339 timestamps for envelopes, intents, and receipts.
// Purpose: Provide deterministic, hash-stable time values across kernel records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Kernel records carry wall-clock instants (validity windows, intent expiry,
//! receipt issuance). They serialize as RFC 3339 strings normalized to UTC so
//! that the same instant always produces the same canonical bytes, and hence
//! the same content hash.
//!
//! Components never read the wall clock directly; they ask an injected
//! [`crate::interfaces::Clock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC instant serialized as an RFC 3339 string.
///
/// # Invariants
/// - The wrapped value is always at UTC offset zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps an instant, normalizing it to UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Builds a timestamp from unix epoch seconds.
    ///
    /// Returns `None` when the value is outside the supported range.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    /// Builds a timestamp from unix epoch milliseconds.
    ///
    /// Returns `None` when the value is outside the supported range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok().map(Self)
    }

    /// Parses an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the input is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self::new)
    }

    /// Returns the wrapped instant.
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the instant as unix epoch milliseconds.
    #[must_use]
    pub fn unix_millis(&self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000_000
    }

    /// Returns fractional seconds elapsed from `earlier` to `self`.
    ///
    /// Negative when `earlier` is in the future relative to `self`.
    #[must_use]
    pub fn seconds_since(&self, earlier: Self) -> f64 {
        (self.0 - earlier.0).as_seconds_f64()
    }

    /// Returns this instant shifted forward by whole seconds, saturating on overflow.
    #[must_use]
    pub fn plus_seconds(&self, seconds: i64) -> Self {
        Self(self.0.saturating_add(time::Duration::seconds(seconds)))
    }

    /// Formats the instant as RFC 3339.
    fn to_rfc3339(self) -> Result<String, time::error::Format> {
        self.0.format(&Rfc3339)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Serde
// ============================================================================

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(|err| de::Error::custom(format!("invalid rfc3339 timestamp: {err}")))
    }
}
