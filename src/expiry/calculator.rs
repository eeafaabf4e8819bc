//! Expiry Calculator Module
//!
//! Pure functions computing concrete expiry instants from absolute and
//! sliding expiration inputs. Used at entry creation and on every
//! refresh/read to renew sliding windows without exceeding the absolute
//! ceiling.

use chrono::{DateTime, TimeDelta, Utc};

/// Adds an interval to an instant, saturating at the far end of the
/// calendar. Matches the codecs' "never expires" convention instead of
/// panicking on a caller-supplied extreme interval.
fn saturating_add(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// == Is Expired ==
/// Checks whether an expiry instant has passed.
///
/// Boundary condition: an entry is considered expired when the current time
/// is greater than or equal to the expiry instant, so an entry expiring
/// exactly now is already expired.
pub fn is_expired(expires_at_utc: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at_utc <= now
}

// == Calculate Absolute Expiration ==
/// Resolves the optional absolute expiration ceiling.
///
/// An explicit absolute instant wins over a relative-to-now interval.
/// Sliding expiration plays no part here.
///
/// # Returns
/// - `Some(absolute)` if an absolute instant was given
/// - `Some(now + relative)` if only a relative interval was given
/// - `None` if neither was given
pub fn calculate_absolute_expiration(
    absolute: Option<DateTime<Utc>>,
    relative_to_now: Option<TimeDelta>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (absolute, relative_to_now) {
        (Some(instant), _) => Some(instant),
        (None, Some(relative)) => Some(saturating_add(now, relative)),
        (None, None) => None,
    }
}

// == Calculate Expiration ==
/// Computes the authoritative expiry instant for an entry.
///
/// The absolute instant acts as a hard ceiling on sliding renewal: when
/// both are present the earlier of the two wins.
///
/// # Returns
/// - `absolute` when only the absolute instant is given
/// - `now + sliding` when only the sliding interval is given
/// - `now + default_sliding` when neither is given
/// - `min(absolute, now + sliding)` when both are given
pub fn calculate_expiration(
    absolute_utc: Option<DateTime<Utc>>,
    sliding: Option<TimeDelta>,
    default_sliding: TimeDelta,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match (absolute_utc, sliding) {
        (Some(absolute), None) => absolute,
        (None, Some(sliding)) => saturating_add(now, sliding),
        (None, None) => saturating_add(now, default_sliding),
        (Some(absolute), Some(sliding)) => absolute.min(saturating_add(now, sliding)),
    }
}
