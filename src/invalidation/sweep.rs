//! Expired Entry Sweepers
//!
//! Backend-specific deletion sweeps: enumerate everything the backend
//! knows, filter to entries past their expiry instant, and delete them.
//! Individual candidate failures are logged and the sweep continues;
//! only a failed enumeration aborts the sweep.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::datastore::METADATA_SUFFIX;
use crate::error::{CacheError, Result};
use crate::expiry::{is_expired, CacheEntryExpiry};
use crate::invalidation::SweepStats;
use crate::storage::{KeyValueStorage, ObjectStorage, StorageError};
use crate::time::Clock;

// == Expired Entry Sweeper Trait ==
/// One full deletion pass over a backend's stored entries.
#[async_trait]
pub trait ExpiredEntrySweeper: Send + Sync {
    /// Enumerates the backend, deletes entries the calculator judges
    /// expired relative to "now", and reports counts.
    async fn delete_expired_cache_entries(&self, cancel: CancellationToken) -> Result<SweepStats>;
}

// == Object Store Sweeper ==
/// Direct list-filter-delete sweep over object enumeration; each object's
/// expiry instant comes from its own metadata.
pub struct ObjectStoreSweeper<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ObjectStorage> ObjectStoreSweeper<S> {
    /// Creates a sweeper over the given object store.
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }
}

#[async_trait]
impl<S: ObjectStorage> ExpiredEntrySweeper for ObjectStoreSweeper<S> {
    async fn delete_expired_cache_entries(&self, cancel: CancellationToken) -> Result<SweepStats> {
        let objects = self
            .storage
            .list_objects()
            .await
            .map_err(|err| CacheError::backend("<sweep enumeration>", anyhow::Error::new(err)))?;

        let now = self.clock.now_utc();
        let mut stats = SweepStats::new();

        for info in objects {
            if cancel.is_cancelled() {
                debug!("Sweep cancelled after {} entries", stats.scanned);
                break;
            }
            stats.record_scanned();

            let expiry = CacheEntryExpiry::from_metadata(&info.metadata);
            if !is_expired(expiry.expires_at_utc, now) {
                continue;
            }

            match self.storage.delete_object(&info.name).await {
                Ok(()) => stats.record_purged(),
                // Already gone is as good as deleted
                Err(StorageError::NotFound) => stats.record_purged(),
                Err(err) => {
                    warn!("Sweep could not delete expired object '{}': {}", info.name, err);
                    stats.record_failure();
                }
            }
        }
        Ok(stats)
    }
}

// == Key-Value Sweeper ==
/// Sweep over a dual-key backend. Only metadata-suffixed keys are
/// enumerated (one candidate per logical entry); the paired value key is
/// derived by stripping the suffix and both halves are purged per expired
/// entry. A half that fails to purge is logged garbage, not a sweep abort.
pub struct KeyValueSweeper<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStorage> KeyValueSweeper<S> {
    /// Creates a sweeper over the given key-value store.
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Purges one key, reporting whether it is confirmed gone.
    async fn purge_half(&self, key: &str) -> bool {
        match self.storage.purge_entry(key).await {
            Ok(()) | Err(StorageError::NotFound) => true,
            Err(err) => {
                warn!("Sweep could not purge key '{}': {}", key, err);
                false
            }
        }
    }
}

#[async_trait]
impl<S: KeyValueStorage> ExpiredEntrySweeper for KeyValueSweeper<S> {
    async fn delete_expired_cache_entries(&self, cancel: CancellationToken) -> Result<SweepStats> {
        let keys = self
            .storage
            .keys()
            .await
            .map_err(|err| CacheError::backend("<sweep enumeration>", anyhow::Error::new(err)))?;

        let now = self.clock.now_utc();
        let mut stats = SweepStats::new();

        for metadata_key in keys {
            if cancel.is_cancelled() {
                debug!("Sweep cancelled after {} entries", stats.scanned);
                break;
            }
            let Some(value_key) = metadata_key.strip_suffix(METADATA_SUFFIX) else {
                continue;
            };
            stats.record_scanned();

            let expiry = match self.storage.get_entry(&metadata_key).await {
                Ok(entry) => match CacheEntryExpiry::from_binary(&entry.value) {
                    Some(expiry) => expiry,
                    None => {
                        warn!("Sweep skipping undecodable metadata key '{}'", metadata_key);
                        stats.record_failure();
                        continue;
                    }
                },
                // Deleted between enumeration and fetch
                Err(StorageError::NotFound) => continue,
                Err(err) => {
                    warn!("Sweep could not read metadata key '{}': {}", metadata_key, err);
                    stats.record_failure();
                    continue;
                }
            };

            if !is_expired(expiry.expires_at_utc, now) {
                continue;
            }

            let value_gone = self.purge_half(value_key).await;
            let metadata_gone = self.purge_half(&metadata_key).await;
            if metadata_gone {
                stats.record_purged();
            }
            if !value_gone || !metadata_gone {
                // Leftover half stays as tolerated garbage for a later pass
                stats.record_failure();
            }
        }
        Ok(stats)
    }
}
