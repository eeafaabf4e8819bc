//! Sweep Statistics Module
//!
//! Counters reported by each expired-entry sweep.

use serde::Serialize;

// == Sweep Stats ==
/// Outcome counters for one sweep over the backing store.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SweepStats {
    /// Number of entries examined
    pub scanned: u64,
    /// Number of expired entries deleted
    pub purged: u64,
    /// Number of candidates whose deletion failed (logged, non-fatal)
    pub failed: u64,
}

impl SweepStats {
    // == Constructor ==
    /// Creates a new SweepStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Scanned ==
    /// Counts one examined entry.
    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    // == Record Purged ==
    /// Counts one deleted entry.
    pub fn record_purged(&mut self) {
        self.purged += 1;
    }

    // == Record Failure ==
    /// Counts one candidate that could not be fully deleted.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}
