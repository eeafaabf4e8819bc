//! Error types for the distributed cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the distributed cache provider.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key is malformed for the target backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration value out of its allowed range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Optimistic update lost to a concurrent writer
    #[error("Conflicting update for key: {0}")]
    Conflict(String),

    /// Transport or serialization failure from the backing store
    #[error("Backend failure for key '{key}': {source}")]
    Backend {
        /// Key the failing operation was addressing
        key: String,
        /// Underlying store error, preserved as the cause
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    /// Wraps a backend failure with the offending key.
    pub fn backend(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns true for the "key absent" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the distributed cache.
pub type Result<T> = std::result::Result<T, CacheError>;
