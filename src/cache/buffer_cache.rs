//! Buffer Distributed Cache Façade
//!
//! Thin composition layer over a datastore and the invalidation scheduler.
//! Every public operation validates the key, gives the scheduler a chance
//! to run a due sweep, then delegates to the datastore. Read paths renew
//! sliding expiration as a best-effort side effect.

use std::io::Write;
use std::sync::Arc;

use chrono::TimeDelta;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::CacheEntryOptions;
use crate::config::CacheConfig;
use crate::datastore::{CacheDatastore, KeyValueDatastore, ObjectStoreDatastore};
use crate::error::{CacheError, Result};
use crate::expiry::{calculate_absolute_expiration, is_expired, CacheEntryExpiry};
use crate::invalidation::{InvalidationScheduler, KeyValueSweeper, ObjectStoreSweeper};
use crate::storage::{KeyValueStorage, ObjectStorage};
use crate::time::Clock;

// == Buffer Distributed Cache ==
/// Public cache surface composing a datastore with time-based invalidation.
pub struct BufferDistributedCache {
    datastore: Arc<dyn CacheDatastore>,
    invalidation: Arc<InvalidationScheduler>,
    clock: Arc<dyn Clock>,
    default_sliding: TimeDelta,
}

impl BufferDistributedCache {
    // == Constructor ==
    /// Composes a cache from explicitly constructed parts.
    pub fn new(
        datastore: Arc<dyn CacheDatastore>,
        invalidation: Arc<InvalidationScheduler>,
        clock: Arc<dyn Clock>,
        default_sliding: TimeDelta,
    ) -> Self {
        Self {
            datastore,
            invalidation,
            clock,
            default_sliding,
        }
    }

    /// Wires a cache over an object store with native metadata.
    ///
    /// # Arguments
    /// * `storage` - Backing object store client
    /// * `config` - Validated at construction; fails fast on range errors
    /// * `clock` - Time source shared by expiry computation and scheduling
    /// * `shutdown` - Cancels in-flight sweeps on shutdown
    pub fn over_object_store<S: ObjectStorage + 'static>(
        storage: Arc<S>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let default_sliding = TimeDelta::seconds(config.default_sliding_secs as i64);

        let datastore = Arc::new(ObjectStoreDatastore::new(
            Arc::clone(&storage),
            Arc::clone(&clock),
            default_sliding,
        ));
        let sweeper = Arc::new(ObjectStoreSweeper::new(storage, Arc::clone(&clock)));
        let invalidation = Arc::new(InvalidationScheduler::new(
            sweeper,
            config,
            Arc::clone(&clock),
            shutdown,
        )?);
        Ok(Self::new(datastore, invalidation, clock, default_sliding))
    }

    /// Wires a cache over a key-value store, using the dual-key scheme.
    pub fn over_key_value_store<S: KeyValueStorage + 'static>(
        storage: Arc<S>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let default_sliding = TimeDelta::seconds(config.default_sliding_secs as i64);

        let datastore = Arc::new(KeyValueDatastore::new(
            Arc::clone(&storage),
            Arc::clone(&clock),
            default_sliding,
        ));
        let sweeper = Arc::new(KeyValueSweeper::new(storage, Arc::clone(&clock)));
        let invalidation = Arc::new(InvalidationScheduler::new(
            sweeper,
            config,
            Arc::clone(&clock),
            shutdown,
        )?);
        Ok(Self::new(datastore, invalidation, clock, default_sliding))
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` for an absent key and for an entry past its expiry
    /// instant that the sweep has not reached yet. A successful read renews
    /// sliding expiration best-effort: if the renewal write fails the value
    /// is still returned, a stale expiry being acceptable where data loss
    /// is not.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut payload = Vec::new();
        if self.try_get(key, &mut payload).await? {
            Ok(Some(payload))
        } else {
            Ok(None)
        }
    }

    // == Try Get ==
    /// Writes the value for `key` into `dest`, returning whether it was found.
    pub async fn try_get(&self, key: &str, dest: &mut (dyn Write + Send)) -> Result<bool> {
        self.datastore.validate_key(key)?;
        self.invalidation.purge_entries_if_required().await;

        let mut payload = Vec::new();
        let (found, expiry) = self.datastore.try_get_entry(key, &mut payload).await?;
        if !found || is_expired(expiry.expires_at_utc, self.clock.now_utc()) {
            return Ok(false);
        }

        if let Err(err) = self.datastore.refresh_entry(key).await {
            warn!("Sliding renewal failed for key '{}': {}", key, err);
        }

        dest.write_all(&payload)
            .map_err(|err| CacheError::backend(key, err))?;
        Ok(true)
    }

    // == Set ==
    /// Stores a value with the default sliding expiration.
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.set_with_options(key, value, CacheEntryOptions::default())
            .await
    }

    /// Stores a value with explicit expiration options.
    pub async fn set_with_options(
        &self,
        key: &str,
        value: &[u8],
        options: CacheEntryOptions,
    ) -> Result<()> {
        self.datastore.validate_key(key)?;
        self.invalidation.purge_entries_if_required().await;

        let expiry = self.compute_expiry(options);
        self.datastore.set_entry(key, value, expiry).await
    }

    /// Stores the concatenation of a sequence of payload segments.
    pub async fn set_segments(
        &self,
        key: &str,
        segments: &[&[u8]],
        options: CacheEntryOptions,
    ) -> Result<()> {
        let total: usize = segments.iter().map(|segment| segment.len()).sum();
        let mut value = Vec::with_capacity(total);
        for segment in segments {
            value.extend_from_slice(segment);
        }
        self.set_with_options(key, &value, options).await
    }

    // == Refresh ==
    /// Renews the entry's sliding expiration without reading its value.
    pub async fn refresh(&self, key: &str) -> Result<()> {
        self.datastore.validate_key(key)?;
        self.invalidation.purge_entries_if_required().await;

        self.datastore.refresh_entry(key).await.map(|_| ())
    }

    // == Remove ==
    /// Removes an entry. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.datastore.validate_key(key)?;
        self.invalidation.purge_entries_if_required().await;

        match self.datastore.remove_entry(key).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn compute_expiry(&self, options: CacheEntryOptions) -> CacheEntryExpiry {
        let now = self.clock.now_utc();
        let absolute = calculate_absolute_expiration(
            options.absolute_expiration,
            options.absolute_expiration_relative_to_now,
            now,
        );
        CacheEntryExpiry::new(absolute, options.sliding_expiration, self.default_sliding, now)
    }
}
