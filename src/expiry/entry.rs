//! Cache Entry Expiry Module
//!
//! Defines the three-valued expiry descriptor persisted alongside every
//! cache entry, plus its two persisted forms: string key/value pairs for
//! backends with native object metadata, and a fixed 24-byte binary layout
//! for backends without one.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::expiry::{
    calculate_expiration, BINARY_EXPIRY_LEN, META_ABSOLUTE_EXPIRATION, META_EXPIRES_AT,
    META_SLIDING_EXPIRATION, NONE_SENTINEL,
};

// == Cache Entry Expiry ==
/// Expiry descriptor for a single cache entry.
///
/// `expires_at_utc` is authoritative: once it passes, the entry is gone.
/// It is always the soonest of the absolute ceiling and "now + sliding
/// interval", and is replaced wholesale on every renewal, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntryExpiry {
    /// Instant at which the entry is considered expired
    pub expires_at_utc: DateTime<Utc>,
    /// Optional hard ceiling that sliding renewal can never exceed
    pub absolute_expiry_at_utc: Option<DateTime<Utc>>,
    /// Optional interval that pushes `expires_at_utc` forward on each touch
    pub sliding_expiry_interval: Option<TimeDelta>,
}

impl CacheEntryExpiry {
    // == Constructor ==
    /// Computes a fresh descriptor from resolved expiration bounds.
    ///
    /// # Arguments
    /// * `absolute` - Resolved absolute ceiling, if any
    /// * `sliding` - Sliding interval, if any
    /// * `default_sliding` - Applied when neither bound is given
    /// * `now` - Current instant
    pub fn new(
        absolute: Option<DateTime<Utc>>,
        sliding: Option<TimeDelta>,
        default_sliding: TimeDelta,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            expires_at_utc: calculate_expiration(absolute, sliding, default_sliding, now),
            absolute_expiry_at_utc: absolute,
            sliding_expiry_interval: sliding,
        }
    }

    // == Renewal ==
    /// Returns the descriptor a successful touch at `now` produces.
    ///
    /// The stored bounds are kept; only the authoritative instant moves,
    /// still capped by the absolute ceiling.
    pub fn renewed(&self, default_sliding: TimeDelta, now: DateTime<Utc>) -> Self {
        Self {
            expires_at_utc: calculate_expiration(
                self.absolute_expiry_at_utc,
                self.sliding_expiry_interval,
                default_sliding,
                now,
            ),
            absolute_expiry_at_utc: self.absolute_expiry_at_utc,
            sliding_expiry_interval: self.sliding_expiry_interval,
        }
    }

    /// The zero descriptor returned alongside "not found" results.
    pub fn zero() -> Self {
        Self {
            expires_at_utc: DateTime::UNIX_EPOCH,
            absolute_expiry_at_utc: None,
            sliding_expiry_interval: None,
        }
    }

    // == Metadata Codec ==
    /// Encodes the descriptor as string key/value pairs for object metadata.
    pub fn to_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(
            META_EXPIRES_AT.to_string(),
            self.expires_at_utc.timestamp_micros().to_string(),
        );
        if let Some(absolute) = self.absolute_expiry_at_utc {
            metadata.insert(META_ABSOLUTE_EXPIRATION.to_string(), absolute.to_rfc3339());
        }
        if let Some(sliding) = self.sliding_expiry_interval {
            metadata.insert(
                META_SLIDING_EXPIRATION.to_string(),
                sliding.num_microseconds().unwrap_or(i64::MAX).to_string(),
            );
        }
        metadata
    }

    /// Decodes a descriptor from object metadata.
    ///
    /// Decoding is total: an absent or unparseable absolute/sliding field
    /// becomes "none", and an absent or unparseable expiry instant becomes
    /// "never expires" rather than an error.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Self {
        let expires_at_utc = metadata
            .get(META_EXPIRES_AT)
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_micros)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let absolute_expiry_at_utc = metadata
            .get(META_ABSOLUTE_EXPIRATION)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|instant| instant.with_timezone(&Utc));

        let sliding_expiry_interval = metadata
            .get(META_SLIDING_EXPIRATION)
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(TimeDelta::microseconds);

        Self {
            expires_at_utc,
            absolute_expiry_at_utc,
            sliding_expiry_interval,
        }
    }

    // == Binary Codec ==
    /// Encodes the descriptor as three little-endian i64 tick fields:
    /// expires-at, absolute (-1 for none), sliding (-1 for none).
    pub fn to_binary(&self) -> [u8; BINARY_EXPIRY_LEN] {
        let expires = self.expires_at_utc.timestamp_micros();
        let absolute = self
            .absolute_expiry_at_utc
            .map(|instant| instant.timestamp_micros())
            .unwrap_or(NONE_SENTINEL);
        let sliding = self
            .sliding_expiry_interval
            .map(|delta| delta.num_microseconds().unwrap_or(i64::MAX))
            .unwrap_or(NONE_SENTINEL);

        let mut buf = [0u8; BINARY_EXPIRY_LEN];
        buf[0..8].copy_from_slice(&expires.to_le_bytes());
        buf[8..16].copy_from_slice(&absolute.to_le_bytes());
        buf[16..24].copy_from_slice(&sliding.to_le_bytes());
        buf
    }

    /// Decodes a descriptor from the binary layout.
    ///
    /// # Returns
    /// `None` if the payload is not exactly [`BINARY_EXPIRY_LEN`] bytes.
    pub fn from_binary(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != BINARY_EXPIRY_LEN {
            return None;
        }

        let read_field = |range: std::ops::Range<usize>| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[range]);
            i64::from_le_bytes(raw)
        };

        let expires = read_field(0..8);
        let absolute = read_field(8..16);
        let sliding = read_field(16..24);

        Some(Self {
            expires_at_utc: DateTime::from_timestamp_micros(expires)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            absolute_expiry_at_utc: (absolute != NONE_SENTINEL)
                .then(|| DateTime::from_timestamp_micros(absolute))
                .flatten(),
            sliding_expiry_interval: (sliding != NONE_SENTINEL)
                .then(|| TimeDelta::microseconds(sliding)),
        })
    }
}

impl Default for CacheEntryExpiry {
    fn default() -> Self {
        Self::zero()
    }
}
