//! Configuration Module
//!
//! Handles loading and validating cache provider configuration.

use std::env;

use crate::error::{CacheError, Result};
use crate::invalidation::MIN_SWEEP_INTERVAL_SECS;

/// Cache provider configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Name of the bucket/store holding the cache entries
    pub bucket: String,
    /// Default sliding expiration in seconds, applied when an entry is
    /// stored without explicit expiration options
    pub default_sliding_secs: u64,
    /// Interval in seconds between expired-entry sweeps
    pub sweep_interval_secs: u64,
    /// Optional cap in seconds on how long a single sweep may run
    pub max_sweep_secs: Option<u64>,
    /// When true, a due sweep is awaited by the triggering cache call
    /// instead of being dispatched in the background
    pub purge_synchronously: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BUCKET` - Store/bucket name (default: "cache")
    /// - `DEFAULT_SLIDING_SECS` - Default sliding expiration in seconds (default: 600)
    /// - `SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 300)
    /// - `MAX_SWEEP_SECS` - Maximum sweep duration in seconds (default: unset)
    /// - `PURGE_SYNCHRONOUSLY` - Await sweeps instead of spawning them (default: false)
    pub fn from_env() -> Self {
        Self {
            bucket: env::var("CACHE_BUCKET").unwrap_or_else(|_| "cache".to_string()),
            default_sliding_secs: env::var("DEFAULT_SLIDING_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            max_sweep_secs: env::var("MAX_SWEEP_SECS").ok().and_then(|v| v.parse().ok()),
            purge_synchronously: env::var("PURGE_SYNCHRONOUSLY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Validates the configuration, failing fast on out-of-range values.
    ///
    /// A sweep interval below [`MIN_SWEEP_INTERVAL_SECS`] would hammer the
    /// backing store with enumeration traffic and is rejected outright.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS {
            return Err(CacheError::InvalidConfig(format!(
                "Sweep interval must be at least {} seconds, got {}",
                MIN_SWEEP_INTERVAL_SECS, self.sweep_interval_secs
            )));
        }
        if self.default_sliding_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "Default sliding expiration must be greater than zero".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "Bucket name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket: "cache".to_string(),
            default_sliding_secs: 600,
            sweep_interval_secs: 300,
            max_sweep_secs: None,
            purge_synchronously: false,
        }
    }
}
