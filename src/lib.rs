//! Buffer Cache - A distributed cache provider
//!
//! Stores cache entries inside a remote object or key-value store and adds
//! the semantics a cache needs but the store does not provide natively:
//! absolute and sliding expiration, periodic invalidation of expired
//! entries, and single-flight scheduling of that invalidation.

pub mod cache;
pub mod config;
pub mod datastore;
pub mod error;
pub mod expiry;
pub mod invalidation;
pub mod storage;
pub mod time;

pub use cache::{BufferDistributedCache, CacheEntryOptions};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use expiry::CacheEntryExpiry;
pub use time::{Clock, ManualClock, SystemClock};
