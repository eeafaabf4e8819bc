//! Expiry Module
//!
//! Pure expiry computation plus the persisted expiry descriptor and its
//! two wire codecs (object-metadata strings and KV binary layout).

mod calculator;
mod entry;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use calculator::{calculate_absolute_expiration, calculate_expiration, is_expired};
pub use entry::CacheEntryExpiry;

// == Public Constants ==
/// Object metadata key holding the authoritative expiry instant (ticks)
pub const META_EXPIRES_AT: &str = "ExpiresAtUtc";

/// Object metadata key holding the optional absolute ceiling (RFC 3339)
pub const META_ABSOLUTE_EXPIRATION: &str = "AbsoluteExpirationUtc";

/// Object metadata key holding the optional sliding interval (ticks)
pub const META_SLIDING_EXPIRATION: &str = "SlidingExpiration";

/// Size in bytes of the binary-encoded expiry descriptor
pub const BINARY_EXPIRY_LEN: usize = 24;

/// Sentinel for "field absent" in the binary layout
pub const NONE_SENTINEL: i64 = -1;
