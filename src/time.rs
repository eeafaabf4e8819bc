//! Time Source Module
//!
//! Provides the clock abstraction used by expiry computation and sweep
//! scheduling. Production code uses [`SystemClock`]; tests inject a
//! [`ManualClock`] so expiration can be driven without sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

// == Clock Trait ==
/// A source of the current UTC instant.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

// == System Clock ==
/// Clock backed by the operating system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// Stores the current instant as microseconds since the Unix epoch in an
/// atomic, so concurrent readers never block.
#[derive(Debug)]
pub struct ManualClock {
    micros: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            micros: AtomicI64::new(start.timestamp_micros()),
        }
    }

    /// Advances the clock by the given interval.
    pub fn advance(&self, delta: TimeDelta) {
        let delta_micros = delta.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(delta_micros, Ordering::SeqCst);
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.micros.store(instant.timestamp_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.micros.load(Ordering::SeqCst))
            .unwrap_or_else(Utc::now)
    }
}
