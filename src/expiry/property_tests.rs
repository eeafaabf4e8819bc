//! Property-Based Tests for the Expiry Module
//!
//! Uses proptest to verify the expiry-calculation laws and codec totality.

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

use crate::expiry::{calculate_expiration, is_expired, CacheEntryExpiry};

// == Strategies ==
/// Generates instants between the epoch and roughly year 2100,
/// at microsecond precision so codecs round-trip exactly.
fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000_000).prop_map(|micros| {
        DateTime::from_timestamp_micros(micros).expect("in-range timestamp")
    })
}

/// Generates intervals from one microsecond up to about ten years.
fn interval_strategy() -> impl Strategy<Value = TimeDelta> {
    (1i64..315_360_000_000_000).prop_map(TimeDelta::microseconds)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* combination of optional absolute and sliding bounds, the
    // computed expiry is: absolute alone, now+sliding alone, the earlier of
    // the two when both are given, and now+default when neither is.
    #[test]
    fn prop_calculate_expiration_law(
        now in instant_strategy(),
        absolute_offset in proptest::option::of(interval_strategy()),
        sliding in proptest::option::of(interval_strategy()),
        default_sliding in interval_strategy(),
    ) {
        let absolute = absolute_offset.map(|offset| now + offset);
        let expires = calculate_expiration(absolute, sliding, default_sliding, now);

        let expected = match (absolute, sliding) {
            (Some(a), None) => a,
            (None, Some(s)) => now + s,
            (None, None) => now + default_sliding,
            (Some(a), Some(s)) => a.min(now + s),
        };
        prop_assert_eq!(expires, expected);
    }

    // *For any* instant pair, is_expired is true exactly when the expiry
    // instant is not after "now" (inclusive boundary).
    #[test]
    fn prop_is_expired_iff_not_after_now(
        expires in instant_strategy(),
        now in instant_strategy(),
    ) {
        prop_assert_eq!(is_expired(expires, now), expires <= now);
    }

    // A descriptor never expires before its own computation instant as long
    // as every bound lies in the future.
    #[test]
    fn prop_fresh_descriptor_not_yet_expired(
        now in instant_strategy(),
        absolute_offset in proptest::option::of(interval_strategy()),
        sliding in proptest::option::of(interval_strategy()),
        default_sliding in interval_strategy(),
    ) {
        let absolute = absolute_offset.map(|offset| now + offset);
        let expiry = CacheEntryExpiry::new(absolute, sliding, default_sliding, now);

        prop_assert!(!is_expired(expiry.expires_at_utc, now));
    }

    // *For any* descriptor, both persisted forms decode back to the same
    // descriptor, including the "no absolute" and "no sliding" cases.
    #[test]
    fn prop_codecs_roundtrip(
        now in instant_strategy(),
        absolute_offset in proptest::option::of(interval_strategy()),
        sliding in proptest::option::of(interval_strategy()),
        default_sliding in interval_strategy(),
    ) {
        let absolute = absolute_offset.map(|offset| now + offset);
        let expiry = CacheEntryExpiry::new(absolute, sliding, default_sliding, now);

        let from_metadata = CacheEntryExpiry::from_metadata(&expiry.to_metadata());
        prop_assert_eq!(from_metadata, expiry, "metadata codec mismatch");

        let from_binary = CacheEntryExpiry::from_binary(&expiry.to_binary())
            .expect("well-sized payload");
        prop_assert_eq!(from_binary, expiry, "binary codec mismatch");
    }
}
