//! Cache Module
//!
//! The public cache façade and its entry-options input type.

mod buffer_cache;
mod options;

// Re-export public types
pub use buffer_cache::BufferDistributedCache;
pub use options::CacheEntryOptions;
