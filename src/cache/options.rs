//! Cache Entry Options Module
//!
//! Expiration inputs accepted at the cache façade boundary, matching the
//! host framework's cache-entry-options convention.

use chrono::{DateTime, TimeDelta, Utc};

// == Cache Entry Options ==
/// Per-entry expiration options for a set operation.
///
/// All fields are optional; an entry stored without any falls back to the
/// configured default sliding expiration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntryOptions {
    /// Fixed instant after which the entry is invalid
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Absolute expiration expressed as an offset from "now" at set time
    pub absolute_expiration_relative_to_now: Option<TimeDelta>,
    /// Interval renewed on each successful access
    pub sliding_expiration: Option<TimeDelta>,
}

impl CacheEntryOptions {
    /// Options with only an absolute expiration instant.
    pub fn absolute(instant: DateTime<Utc>) -> Self {
        Self {
            absolute_expiration: Some(instant),
            ..Self::default()
        }
    }

    /// Options with only an absolute expiration relative to now.
    pub fn expires_in(interval: TimeDelta) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(interval),
            ..Self::default()
        }
    }

    /// Options with only a sliding expiration interval.
    pub fn sliding(interval: TimeDelta) -> Self {
        Self {
            sliding_expiration: Some(interval),
            ..Self::default()
        }
    }

    /// Sets the sliding expiration, keeping the other fields.
    pub fn with_sliding(mut self, interval: TimeDelta) -> Self {
        self.sliding_expiration = Some(interval);
        self
    }
}
