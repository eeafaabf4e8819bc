//! Object Storage Contract
//!
//! The slice of an object store the cache consumes: one physical object
//! per entry, with expiry fields carried in the object's native metadata.

use std::collections::HashMap;
use std::io::Write;

use async_trait::async_trait;

use crate::storage::StorageResult;

// == Object Info ==
/// Descriptive record for a stored object, as returned by info/list calls.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object name (the cache key)
    pub name: String,
    /// Native metadata map attached to the object
    pub metadata: HashMap<String, String>,
    /// Payload size in bytes
    pub size: usize,
}

// == Object Storage Trait ==
/// Operations consumed from an object store with native metadata support.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Streams an object's payload into `dest` and returns its info.
    async fn get_object(
        &self,
        name: &str,
        dest: &mut (dyn Write + Send),
    ) -> StorageResult<ObjectInfo>;

    /// Writes an object's payload and metadata, replacing any previous object.
    async fn put_object(
        &self,
        name: &str,
        payload: &[u8],
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;

    /// Replaces an existing object's metadata without touching its payload.
    async fn update_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;

    /// Returns an object's info without fetching the payload.
    async fn object_info(&self, name: &str) -> StorageResult<ObjectInfo>;

    /// Deletes an object.
    async fn delete_object(&self, name: &str) -> StorageResult<()>;

    /// Lists every stored object with its metadata, for sweep enumeration.
    async fn list_objects(&self) -> StorageResult<Vec<ObjectInfo>>;
}
