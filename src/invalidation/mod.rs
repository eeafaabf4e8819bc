//! Invalidation Module
//!
//! Periodic removal of expired entries: a time-gated, single-flight
//! scheduler driving a backend-specific sweep.

mod scheduler;
mod stats;
mod sweep;

// Re-export public types
pub use scheduler::InvalidationScheduler;
pub use stats::SweepStats;
pub use sweep::{ExpiredEntrySweeper, KeyValueSweeper, ObjectStoreSweeper};

// == Public Constants ==
/// Minimum allowed sweep interval in seconds.
///
/// Anything shorter would hammer the backing store with enumeration
/// traffic; construction fails fast below this.
pub const MIN_SWEEP_INTERVAL_SECS: u64 = 60;
