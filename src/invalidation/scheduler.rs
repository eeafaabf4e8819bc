//! Time-Based Invalidation Scheduler
//!
//! Decides when a sweep over all entries is due and guarantees at most one
//! sweep runs at a time. The guard is a compare-and-set over an atomic
//! flag, so the common "not due yet" check never blocks a cache call.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::invalidation::{ExpiredEntrySweeper, MIN_SWEEP_INTERVAL_SECS};
use crate::time::Clock;

// == Sweep Permit ==
/// Drop guard releasing the single-flight flag.
///
/// Tied to a Drop impl so neither a failed sweep, a cancelled one, nor an
/// early "not due" return can leave the scheduler wedged in "sweeping".
struct SweepPermit(Arc<AtomicBool>);

impl Drop for SweepPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Invalidation Scheduler ==
/// Time-gated, single-flight dispatcher for expired-entry sweeps.
pub struct InvalidationScheduler {
    sweeper: Arc<dyn ExpiredEntrySweeper>,
    clock: Arc<dyn Clock>,
    sweep_interval: TimeDelta,
    max_sweep_duration: Option<Duration>,
    purge_synchronously: bool,
    last_sweep_micros: AtomicI64,
    sweeping: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl InvalidationScheduler {
    // == Constructor ==
    /// Creates a scheduler for the given sweeper.
    ///
    /// The last-sweep timestamp starts at "now", so the first sweep becomes
    /// due one full interval after construction.
    ///
    /// # Errors
    /// Fails with [`CacheError::InvalidConfig`] when the configured sweep
    /// interval is below [`MIN_SWEEP_INTERVAL_SECS`], before any scheduler
    /// state is created.
    pub fn new(
        sweeper: Arc<dyn ExpiredEntrySweeper>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        if config.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS {
            return Err(CacheError::InvalidConfig(format!(
                "Sweep interval must be at least {} seconds, got {}",
                MIN_SWEEP_INTERVAL_SECS, config.sweep_interval_secs
            )));
        }

        let now_micros = clock.now_utc().timestamp_micros();
        Ok(Self {
            sweeper,
            clock,
            sweep_interval: TimeDelta::seconds(config.sweep_interval_secs as i64),
            max_sweep_duration: config.max_sweep_secs.map(Duration::from_secs),
            purge_synchronously: config.purge_synchronously,
            last_sweep_micros: AtomicI64::new(now_micros),
            sweeping: Arc::new(AtomicBool::new(false)),
            shutdown,
        })
    }

    // == Purge Entries If Required ==
    /// Launches a sweep when one is due and none is in flight.
    ///
    /// Concurrent callers that lose the idle-to-sweeping transition return
    /// immediately without error; so does a caller arriving before the
    /// interval has elapsed. The last-sweep timestamp is advanced before
    /// the sweep body starts, so a long sweep is not re-triggered by the
    /// next caller the moment it finishes.
    pub async fn purge_entries_if_required(&self) {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Expired entry sweep already in flight, skipping");
            return;
        }
        let permit = SweepPermit(Arc::clone(&self.sweeping));

        let now = self.clock.now_utc();
        let last_micros = self.last_sweep_micros.load(Ordering::Acquire);
        let elapsed = TimeDelta::microseconds(now.timestamp_micros() - last_micros);
        if elapsed < self.sweep_interval {
            // Not due yet; permit drop releases the guard
            return;
        }
        self.last_sweep_micros
            .store(now.timestamp_micros(), Ordering::Release);

        let cancel = self.shutdown.child_token();
        if self.purge_synchronously {
            let _permit = permit;
            run_sweep(Arc::clone(&self.sweeper), cancel, self.max_sweep_duration).await;
        } else {
            let sweeper = Arc::clone(&self.sweeper);
            let max_duration = self.max_sweep_duration;
            tokio::spawn(async move {
                let _permit = permit;
                run_sweep(sweeper, cancel, max_duration).await;
            });
        }
    }

    /// Returns true while a sweep body is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::Acquire)
    }
}

// == Run Sweep ==
/// Executes one sweep body, applying the optional duration cap and logging
/// the outcome. A failed sweep is logged, never propagated: the guard is
/// released by the caller's permit and a later due-check retries.
async fn run_sweep(
    sweeper: Arc<dyn ExpiredEntrySweeper>,
    cancel: CancellationToken,
    max_duration: Option<Duration>,
) {
    let sweep = sweeper.delete_expired_cache_entries(cancel.clone());
    let outcome = match max_duration {
        Some(cap) => match tokio::time::timeout(cap, sweep).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                warn!("Expired entry sweep exceeded its {:?} cap, aborted", cap);
                return;
            }
        },
        None => sweep.await,
    };

    match outcome {
        Ok(stats) => {
            let summary = serde_json::to_string(&stats).unwrap_or_default();
            if stats.purged > 0 {
                info!("Sweep finished: {}", summary);
            } else {
                debug!("Sweep found no expired entries: {}", summary);
            }
        }
        Err(err) => warn!("Expired entry sweep failed: {}", err),
    }
}
