//! Storage Module
//!
//! Contracts for the remote backing stores the cache rides on: an object
//! store with native per-object metadata and a key-value store without one.
//! The in-memory implementations back the test suite and small embedded
//! deployments.

mod kv;
mod memory;
mod object;

// Re-export public types
pub use kv::{KeyValueStorage, KvEntry};
pub use memory::{InMemoryKvStore, InMemoryObjectStore};
pub use object::{ObjectInfo, ObjectStorage};

use thiserror::Error;

// == Storage Error Enum ==
/// Failure conditions a backing store can report.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The addressed object/entry does not exist
    #[error("not found")]
    NotFound,

    /// An optimistic update lost to a concurrent writer
    #[error("revision mismatch")]
    RevisionMismatch,

    /// Transport or protocol failure
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

// == Result Type Alias ==
/// Convenience Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
