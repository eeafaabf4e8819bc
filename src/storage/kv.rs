//! Key-Value Storage Contract
//!
//! The slice of a key-value store the cache consumes. The store has no
//! metadata channel, so the cache layers a shadow key on top; what the
//! store must provide is plain get/put/purge, key enumeration, and
//! revision-conditioned updates for optimistic concurrency.

use async_trait::async_trait;

use crate::storage::StorageResult;

// == KV Entry ==
/// A fetched key-value entry together with its store revision.
#[derive(Debug, Clone)]
pub struct KvEntry {
    /// Entry payload
    pub value: Vec<u8>,
    /// Monotonic revision assigned by the store on each write
    pub revision: u64,
}

// == Key-Value Storage Trait ==
/// Operations consumed from a key-value store without metadata support.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Fetches an entry and its current revision.
    async fn get_entry(&self, key: &str) -> StorageResult<KvEntry>;

    /// Writes an entry unconditionally and returns the new revision.
    async fn put_entry(&self, key: &str, value: &[u8]) -> StorageResult<u64>;

    /// Writes an entry only if its current revision matches
    /// `expected_revision`, returning the new revision.
    ///
    /// Fails with [`StorageError::RevisionMismatch`] when a concurrent
    /// writer got there first.
    ///
    /// [`StorageError::RevisionMismatch`]: crate::storage::StorageError::RevisionMismatch
    async fn update_entry(
        &self,
        key: &str,
        value: &[u8],
        expected_revision: u64,
    ) -> StorageResult<u64>;

    /// Removes an entry and its history.
    async fn purge_entry(&self, key: &str) -> StorageResult<()>;

    /// Lists every key in the store, for sweep enumeration.
    async fn keys(&self) -> StorageResult<Vec<String>>;
}
