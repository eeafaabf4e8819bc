//! Key-Value-Store-Backed Datastore
//!
//! The key-value store has no metadata channel, so every cache entry is
//! represented by two physical keys: the value key holding the payload and
//! a shadow key (logical key + `-metadata`) holding the binary-encoded
//! expiry descriptor. The pair should exist or not exist together;
//! temporary divergence is tolerated garbage and never fails a top-level
//! operation on its own.

use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::TimeDelta;
use tracing::debug;

use crate::datastore::{
    map_storage_error, validate_key_basic, CacheDatastore, KEY_SEPARATOR, METADATA_SUFFIX,
};
use crate::error::{CacheError, Result};
use crate::expiry::CacheEntryExpiry;
use crate::storage::{KeyValueStorage, StorageError};
use crate::time::Clock;

// == Key-Value Datastore ==
/// Datastore riding on a key-value store without metadata support.
pub struct KeyValueDatastore<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    default_sliding: TimeDelta,
}

impl<S: KeyValueStorage> KeyValueDatastore<S> {
    // == Constructor ==
    /// Creates a datastore over the given key-value store.
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>, default_sliding: TimeDelta) -> Self {
        Self {
            storage,
            clock,
            default_sliding,
        }
    }

    /// Derives the shadow metadata key for a logical key.
    pub fn metadata_key(key: &str) -> String {
        format!("{key}{METADATA_SUFFIX}")
    }

    /// Reads and decodes the metadata entry, returning its revision too.
    async fn read_expiry(&self, key: &str) -> Result<(CacheEntryExpiry, u64)> {
        let metadata_key = Self::metadata_key(key);
        let entry = self
            .storage
            .get_entry(&metadata_key)
            .await
            .map_err(|err| map_storage_error(key, err))?;

        let expiry = CacheEntryExpiry::from_binary(&entry.value).ok_or_else(|| {
            CacheError::backend(
                key,
                anyhow!(
                    "metadata entry has invalid length {} (expected {})",
                    entry.value.len(),
                    crate::expiry::BINARY_EXPIRY_LEN
                ),
            )
        })?;
        Ok((expiry, entry.revision))
    }
}

#[async_trait]
impl<S: KeyValueStorage> CacheDatastore for KeyValueDatastore<S> {
    async fn get_entry_expiry(&self, key: &str) -> Result<CacheEntryExpiry> {
        let (expiry, _) = self.read_expiry(key).await?;
        Ok(expiry)
    }

    async fn refresh_entry(&self, key: &str) -> Result<CacheEntryExpiry> {
        let (stored, revision) = self.read_expiry(key).await?;
        let renewed = stored.renewed(self.default_sliding, self.clock.now_utc());

        // Conditioned on the revision read above, so a concurrent writer's
        // expiry update is never silently discarded.
        self.storage
            .update_entry(&Self::metadata_key(key), &renewed.to_binary(), revision)
            .await
            .map_err(|err| map_storage_error(key, err))?;
        Ok(renewed)
    }

    async fn remove_entry(&self, key: &str) -> Result<()> {
        let metadata_key = Self::metadata_key(key);
        let value_result = self.storage.purge_entry(key).await;
        let metadata_result = self.storage.purge_entry(&metadata_key).await;

        match (value_result, metadata_result) {
            (Err(StorageError::Io(cause)), _) => Err(CacheError::backend(key, cause)),
            (_, Err(StorageError::Io(cause))) => Err(CacheError::backend(metadata_key, cause)),
            (Err(StorageError::NotFound), Err(StorageError::NotFound)) => {
                Err(CacheError::NotFound(key.to_string()))
            }
            // One half missing is tolerated garbage
            _ => Ok(()),
        }
    }

    async fn try_get_entry(
        &self,
        key: &str,
        dest: &mut (dyn Write + Send),
    ) -> Result<(bool, CacheEntryExpiry)> {
        // Metadata first: an undecodable or missing half reads as absent.
        let metadata_entry = match self.storage.get_entry(&Self::metadata_key(key)).await {
            Ok(entry) => entry,
            Err(StorageError::NotFound) => {
                debug!(key, "metadata key absent, treating entry as not found");
                return Ok((false, CacheEntryExpiry::zero()));
            }
            Err(err) => return Err(map_storage_error(key, err)),
        };
        let Some(expiry) = CacheEntryExpiry::from_binary(&metadata_entry.value) else {
            debug!(key, "metadata entry undecodable, treating entry as not found");
            return Ok((false, CacheEntryExpiry::zero()));
        };

        let value_entry = match self.storage.get_entry(key).await {
            Ok(entry) => entry,
            Err(StorageError::NotFound) => {
                debug!(key, "value key absent, treating entry as not found");
                return Ok((false, CacheEntryExpiry::zero()));
            }
            Err(err) => return Err(map_storage_error(key, err)),
        };

        dest.write_all(&value_entry.value)
            .map_err(|err| CacheError::backend(key, err))?;
        Ok((true, expiry))
    }

    async fn set_entry(&self, key: &str, payload: &[u8], expiry: CacheEntryExpiry) -> Result<()> {
        // Two physical writes; a crash in between leaves tolerated garbage
        // that the sweep or a later read treats as absent.
        self.storage
            .put_entry(key, payload)
            .await
            .map_err(|err| map_storage_error(key, err))?;
        self.storage
            .put_entry(&Self::metadata_key(key), &expiry.to_binary())
            .await
            .map_err(|err| map_storage_error(key, err))?;
        Ok(())
    }

    fn validate_key(&self, key: &str) -> Result<()> {
        validate_key_basic(key)?;

        if key.starts_with(KEY_SEPARATOR) || key.ends_with(KEY_SEPARATOR) {
            return Err(CacheError::InvalidKey(format!(
                "Key must not begin or end with '{KEY_SEPARATOR}': {key}"
            )));
        }
        if let Some(bad) = key
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '/' | '=' | '.'))
        {
            return Err(CacheError::InvalidKey(format!(
                "Key contains invalid character '{bad}': {key}"
            )));
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::expiry::is_expired;
    use crate::storage::{InMemoryKvStore, KvEntry, StorageResult};
    use crate::time::ManualClock;

    fn default_sliding() -> TimeDelta {
        TimeDelta::minutes(10)
    }

    fn datastore() -> (
        KeyValueDatastore<InMemoryKvStore>,
        Arc<InMemoryKvStore>,
        Arc<ManualClock>,
    ) {
        let storage = Arc::new(InMemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let datastore = KeyValueDatastore::new(Arc::clone(&storage), clock_dyn, default_sliding());
        (datastore, storage, clock)
    }

    fn fresh_expiry(clock: &ManualClock) -> CacheEntryExpiry {
        CacheEntryExpiry::new(None, None, default_sliding(), clock.now_utc())
    }

    #[tokio::test]
    async fn test_set_writes_both_keys() {
        let (datastore, storage, clock) = datastore();

        datastore
            .set_entry("k1", b"payload", fresh_expiry(&clock))
            .await
            .unwrap();

        assert!(storage.get_entry("k1").await.is_ok());
        assert!(storage.get_entry("k1-metadata").await.is_ok());
    }

    #[tokio::test]
    async fn test_set_then_try_get() {
        let (datastore, _, clock) = datastore();
        let expiry = fresh_expiry(&clock);
        datastore.set_entry("k1", b"payload", expiry).await.unwrap();

        let mut dest = Vec::new();
        let (found, stored) = datastore.try_get_entry("k1", &mut dest).await.unwrap();
        assert!(found);
        assert_eq!(dest, b"payload");
        assert_eq!(stored, expiry);
    }

    #[tokio::test]
    async fn test_try_get_without_metadata_key_is_not_found() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"payload", fresh_expiry(&clock))
            .await
            .unwrap();

        // Manually lose the metadata half of the pair
        storage.purge_entry("k1-metadata").await.unwrap();

        let mut dest = Vec::new();
        let (found, expiry) = datastore.try_get_entry("k1", &mut dest).await.unwrap();
        assert!(!found);
        assert!(dest.is_empty());
        assert_eq!(expiry, CacheEntryExpiry::zero());
    }

    #[tokio::test]
    async fn test_try_get_without_value_key_is_not_found() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"payload", fresh_expiry(&clock))
            .await
            .unwrap();

        storage.purge_entry("k1").await.unwrap();

        let mut dest = Vec::new();
        let (found, _) = datastore.try_get_entry("k1", &mut dest).await.unwrap();
        assert!(!found);
        assert!(dest.is_empty());
    }

    #[tokio::test]
    async fn test_try_get_undecodable_metadata_is_not_found() {
        let (datastore, storage, _) = datastore();
        storage.put_entry("k1", b"payload").await.unwrap();
        storage.put_entry("k1-metadata", b"short").await.unwrap();

        let mut dest = Vec::new();
        let (found, _) = datastore.try_get_entry("k1", &mut dest).await.unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn test_get_expiry_missing_metadata_is_strict_not_found() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"payload", fresh_expiry(&clock))
            .await
            .unwrap();
        storage.purge_entry("k1-metadata").await.unwrap();

        // Refresh has nothing to renew from, so the missing half is an error here
        assert!(matches!(
            datastore.get_entry_expiry("k1").await,
            Err(CacheError::NotFound(_))
        ));
        assert!(matches!(
            datastore.refresh_entry("k1").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_renews_and_persists() {
        let (datastore, _, clock) = datastore();
        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();

        clock.advance(TimeDelta::minutes(9));
        let renewed = datastore.refresh_entry("k1").await.unwrap();

        assert_eq!(renewed.expires_at_utc, clock.now_utc() + default_sliding());
        assert!(!is_expired(renewed.expires_at_utc, clock.now_utc()));
        assert_eq!(datastore.get_entry_expiry("k1").await.unwrap(), renewed);
    }

    #[tokio::test]
    async fn test_refresh_detects_concurrent_writer() {
        // Store whose conditional update always loses the race
        #[derive(Debug, Default)]
        struct ContendedStore {
            inner: InMemoryKvStore,
        }

        #[async_trait]
        impl KeyValueStorage for ContendedStore {
            async fn get_entry(&self, key: &str) -> StorageResult<KvEntry> {
                self.inner.get_entry(key).await
            }
            async fn put_entry(&self, key: &str, value: &[u8]) -> StorageResult<u64> {
                self.inner.put_entry(key, value).await
            }
            async fn update_entry(&self, _: &str, _: &[u8], _: u64) -> StorageResult<u64> {
                Err(StorageError::RevisionMismatch)
            }
            async fn purge_entry(&self, key: &str) -> StorageResult<()> {
                self.inner.purge_entry(key).await
            }
            async fn keys(&self) -> StorageResult<Vec<String>> {
                self.inner.keys().await
            }
        }

        let storage = Arc::new(ContendedStore::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let datastore = KeyValueDatastore::new(storage, clock_dyn, default_sliding());

        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();

        assert!(matches!(
            datastore.refresh_entry("k1").await,
            Err(CacheError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_purges_both_keys() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();

        datastore.remove_entry("k1").await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_tolerates_one_missing_half() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();
        storage.purge_entry("k1-metadata").await.unwrap();

        assert!(datastore.remove_entry("k1").await.is_ok());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_fully_absent_is_not_found() {
        let (datastore, _, _) = datastore();
        assert!(matches!(
            datastore.remove_entry("missing").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_key_rules() {
        let (datastore, _, _) = datastore();

        assert!(datastore.validate_key("users/42=profile.v1_a-b").is_ok());
        assert!(datastore.validate_key("").is_err());
        assert!(datastore.validate_key(".leading").is_err());
        assert!(datastore.validate_key("trailing.").is_err());
        assert!(datastore.validate_key("has space").is_err());
        assert!(datastore.validate_key("emoji🚀").is_err());
    }
}
