//! Datastore Module
//!
//! The storage-facing contract both backends satisfy identically: get,
//! refresh, remove, try-get and set a cache entry plus its expiry
//! descriptor, and validate keys for the target backend.

mod kv;
mod object;

// Re-export public types
pub use kv::KeyValueDatastore;
pub use object::ObjectStoreDatastore;

use std::io::Write;

use async_trait::async_trait;

use crate::error::{CacheError, Result};
use crate::expiry::CacheEntryExpiry;
use crate::storage::StorageError;

// == Public Constants ==
/// Suffix appended to a logical key to form its shadow metadata key
pub const METADATA_SUFFIX: &str = "-metadata";

/// Key separator character the KV backend reserves
pub const KEY_SEPARATOR: char = '.';

// == Cache Datastore Trait ==
/// Storage-facing operations for one cache backend.
#[async_trait]
pub trait CacheDatastore: Send + Sync {
    /// Reads the stored expiry descriptor for an entry.
    ///
    /// Fails with [`CacheError::NotFound`] when the entry (or its metadata
    /// representation) is absent.
    async fn get_entry_expiry(&self, key: &str) -> Result<CacheEntryExpiry>;

    /// Renews the entry's expiry from its stored absolute/sliding bounds
    /// and persists the recomputed descriptor.
    async fn refresh_entry(&self, key: &str) -> Result<CacheEntryExpiry>;

    /// Deletes every physical representation of the entry.
    async fn remove_entry(&self, key: &str) -> Result<()>;

    /// Writes the entry payload into `dest`.
    ///
    /// Returns `(false, zero-expiry)` without error when the entry is
    /// absent; any other storage failure is a hard error.
    async fn try_get_entry(
        &self,
        key: &str,
        dest: &mut (dyn Write + Send),
    ) -> Result<(bool, CacheEntryExpiry)>;

    /// Writes payload and expiry descriptor for an entry.
    async fn set_entry(&self, key: &str, payload: &[u8], expiry: CacheEntryExpiry) -> Result<()>;

    /// Checks the key against the backend's key rules.
    fn validate_key(&self, key: &str) -> Result<()>;
}

// == Shared Helpers ==
/// Rejects empty and whitespace-only keys; every backend applies this.
pub(crate) fn validate_key_basic(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey(
            "Key must not be empty or whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Maps a storage failure onto the cache error taxonomy, attaching the
/// offending key.
pub(crate) fn map_storage_error(key: &str, err: StorageError) -> CacheError {
    match err {
        StorageError::NotFound => CacheError::NotFound(key.to_string()),
        StorageError::RevisionMismatch => CacheError::Conflict(key.to_string()),
        StorageError::Io(cause) => CacheError::backend(key, cause),
    }
}
