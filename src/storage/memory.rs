//! In-Memory Storage Backends
//!
//! HashMap-backed implementations of both storage contracts. They carry
//! full metadata and revision semantics, so the datastore and sweep logic
//! can be exercised without a remote store.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::{
    KeyValueStorage, KvEntry, ObjectInfo, ObjectStorage, StorageError, StorageResult,
};

// == In-Memory Object Store ==
/// Object store holding payloads and metadata in a guarded HashMap.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    payload: Vec<u8>,
    metadata: HashMap<String, String>,
}

impl InMemoryObjectStore {
    /// Creates an empty object store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns true when no objects are stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStore {
    async fn get_object(
        &self,
        name: &str,
        dest: &mut (dyn Write + Send),
    ) -> StorageResult<ObjectInfo> {
        let objects = self.objects.read().await;
        let object = objects.get(name).ok_or(StorageError::NotFound)?;

        dest.write_all(&object.payload)
            .map_err(|err| StorageError::Io(anyhow!(err)))?;

        Ok(ObjectInfo {
            name: name.to_string(),
            metadata: object.metadata.clone(),
            size: object.payload.len(),
        })
    }

    async fn put_object(
        &self,
        name: &str,
        payload: &[u8],
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        objects.insert(
            name.to_string(),
            StoredObject {
                payload: payload.to_vec(),
                metadata,
            },
        );
        Ok(())
    }

    async fn update_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        let object = objects.get_mut(name).ok_or(StorageError::NotFound)?;
        object.metadata = metadata;
        Ok(())
    }

    async fn object_info(&self, name: &str) -> StorageResult<ObjectInfo> {
        let objects = self.objects.read().await;
        let object = objects.get(name).ok_or(StorageError::NotFound)?;
        Ok(ObjectInfo {
            name: name.to_string(),
            metadata: object.metadata.clone(),
            size: object.payload.len(),
        })
    }

    async fn delete_object(&self, name: &str) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        objects.remove(name).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    async fn list_objects(&self) -> StorageResult<Vec<ObjectInfo>> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .map(|(name, object)| ObjectInfo {
                name: name.clone(),
                metadata: object.metadata.clone(),
                size: object.payload.len(),
            })
            .collect())
    }
}

// == In-Memory KV Store ==
/// Key-value store with monotonically increasing per-write revisions.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    entries: RwLock<HashMap<String, KvEntry>>,
    revision_counter: AtomicU64,
}

impl InMemoryKvStore {
    /// Creates an empty key-value store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true when no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn next_revision(&self) -> u64 {
        self.revision_counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryKvStore {
    async fn get_entry(&self, key: &str) -> StorageResult<KvEntry> {
        let entries = self.entries.read().await;
        entries.get(key).cloned().ok_or(StorageError::NotFound)
    }

    async fn put_entry(&self, key: &str, value: &[u8]) -> StorageResult<u64> {
        let revision = self.next_revision();
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            KvEntry {
                value: value.to_vec(),
                revision,
            },
        );
        Ok(revision)
    }

    async fn update_entry(
        &self,
        key: &str,
        value: &[u8],
        expected_revision: u64,
    ) -> StorageResult<u64> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(key).ok_or(StorageError::NotFound)?;
        if entry.revision != expected_revision {
            return Err(StorageError::RevisionMismatch);
        }

        let revision = self.revision_counter.fetch_add(1, Ordering::Relaxed) + 1;
        entry.value = value.to_vec();
        entry.revision = revision;
        Ok(revision)
    }

    async fn purge_entry(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }
}
