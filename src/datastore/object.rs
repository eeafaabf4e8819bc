//! Object-Store-Backed Datastore
//!
//! One physical object per entry; the expiry descriptor lives in the
//! object's own metadata map, so every operation maps 1:1 onto the store's
//! native get/put/update-metadata/delete primitives.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;

use crate::datastore::{map_storage_error, validate_key_basic, CacheDatastore};
use crate::error::Result;
use crate::expiry::CacheEntryExpiry;
use crate::storage::{ObjectStorage, StorageError};
use crate::time::Clock;

// == Object Store Datastore ==
/// Datastore riding on an object store with native per-object metadata.
pub struct ObjectStoreDatastore<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    default_sliding: TimeDelta,
}

impl<S: ObjectStorage> ObjectStoreDatastore<S> {
    // == Constructor ==
    /// Creates a datastore over the given object store.
    ///
    /// # Arguments
    /// * `storage` - Backing object store
    /// * `clock` - Time source for expiry computation
    /// * `default_sliding` - Sliding interval applied when an entry carries
    ///   no expiration bounds
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>, default_sliding: TimeDelta) -> Self {
        Self {
            storage,
            clock,
            default_sliding,
        }
    }
}

#[async_trait]
impl<S: ObjectStorage> CacheDatastore for ObjectStoreDatastore<S> {
    async fn get_entry_expiry(&self, key: &str) -> Result<CacheEntryExpiry> {
        let info = self
            .storage
            .object_info(key)
            .await
            .map_err(|err| map_storage_error(key, err))?;
        Ok(CacheEntryExpiry::from_metadata(&info.metadata))
    }

    async fn refresh_entry(&self, key: &str) -> Result<CacheEntryExpiry> {
        let info = self
            .storage
            .object_info(key)
            .await
            .map_err(|err| map_storage_error(key, err))?;

        let stored = CacheEntryExpiry::from_metadata(&info.metadata);
        let renewed = stored.renewed(self.default_sliding, self.clock.now_utc());

        self.storage
            .update_metadata(key, renewed.to_metadata())
            .await
            .map_err(|err| map_storage_error(key, err))?;
        Ok(renewed)
    }

    async fn remove_entry(&self, key: &str) -> Result<()> {
        self.storage
            .delete_object(key)
            .await
            .map_err(|err| map_storage_error(key, err))
    }

    async fn try_get_entry(
        &self,
        key: &str,
        dest: &mut (dyn Write + Send),
    ) -> Result<(bool, CacheEntryExpiry)> {
        match self.storage.get_object(key, dest).await {
            Ok(info) => Ok((true, CacheEntryExpiry::from_metadata(&info.metadata))),
            Err(StorageError::NotFound) => Ok((false, CacheEntryExpiry::zero())),
            Err(err) => Err(map_storage_error(key, err)),
        }
    }

    async fn set_entry(&self, key: &str, payload: &[u8], expiry: CacheEntryExpiry) -> Result<()> {
        self.storage
            .put_object(key, payload, expiry.to_metadata())
            .await
            .map_err(|err| map_storage_error(key, err))
    }

    fn validate_key(&self, key: &str) -> Result<()> {
        validate_key_basic(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::error::CacheError;
    use crate::expiry::is_expired;
    use crate::storage::InMemoryObjectStore;
    use crate::time::ManualClock;

    fn default_sliding() -> TimeDelta {
        TimeDelta::minutes(10)
    }

    fn datastore() -> (
        ObjectStoreDatastore<InMemoryObjectStore>,
        Arc<InMemoryObjectStore>,
        Arc<ManualClock>,
    ) {
        let storage = Arc::new(InMemoryObjectStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let datastore = ObjectStoreDatastore::new(Arc::clone(&storage), clock_dyn, default_sliding());
        (datastore, storage, clock)
    }

    fn fresh_expiry(clock: &ManualClock) -> CacheEntryExpiry {
        CacheEntryExpiry::new(None, None, default_sliding(), clock.now_utc())
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
    async fn test_try_get_missing_is_not_an_error() {
        let (datastore, _, _) = datastore();

        let mut dest = Vec::new();
        let (found, expiry) = datastore.try_get_entry("missing", &mut dest).await.unwrap();
        assert!(!found);
        assert_eq!(expiry, CacheEntryExpiry::zero());
    }

    #[tokio::test]
    async fn test_get_expiry_missing_is_not_found() {
        let (datastore, _, _) = datastore();

        let result = datastore.get_entry_expiry("missing").await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_refresh_renews_sliding_window() {
        let (datastore, _, clock) = datastore();
        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();

        clock.advance(TimeDelta::minutes(9));
        let renewed = datastore.refresh_entry("k1").await.unwrap();

        assert_eq!(renewed.expires_at_utc, clock.now_utc() + default_sliding());
        assert!(!is_expired(renewed.expires_at_utc, clock.now_utc()));

        // Persisted, not just returned
        let stored = datastore.get_entry_expiry("k1").await.unwrap();
        assert_eq!(stored, renewed);
    }

    #[tokio::test]
    async fn test_refresh_never_exceeds_absolute_ceiling() {
        let (datastore, _, clock) = datastore();
        let now = clock.now_utc();
        let absolute = now + TimeDelta::minutes(5);
        let expiry =
            CacheEntryExpiry::new(Some(absolute), Some(TimeDelta::minutes(4)), default_sliding(), now);
        datastore.set_entry("k1", b"v", expiry).await.unwrap();

        clock.advance(TimeDelta::minutes(3));
        let renewed = datastore.refresh_entry("k1").await.unwrap();
        assert_eq!(renewed.expires_at_utc, absolute);
    }

    #[tokio::test]
    async fn test_refresh_missing_is_not_found() {
        let (datastore, _, _) = datastore();
        assert!(matches!(
            datastore.refresh_entry("missing").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_deletes_object() {
        let (datastore, storage, clock) = datastore();
        datastore
            .set_entry("k1", b"v", fresh_expiry(&clock))
            .await
            .unwrap();

        datastore.remove_entry("k1").await.unwrap();
        assert!(storage.is_empty().await);

        assert!(matches!(
            datastore.remove_entry("k1").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_key() {
        let (datastore, _, _) = datastore();
        assert!(datastore.validate_key("fine").is_ok());
        assert!(datastore.validate_key("  ").is_err());
    }
}
