//! Configuration Module
//!
//! Handles loading and managing cache engine configuration from environment
//! variables.

use std::env;
use std::time::Duration;

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction kicks in;
    /// 0 disables LRU and leaves the cache unbounded
    pub capacity: usize,
    /// How often the background reconciliation task runs
    pub reconcile_interval: Duration,
}

impl CacheConfig {
    /// Creates a new config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - LRU capacity, 0 = unbounded (default: 0)
    /// - `RECONCILE_INTERVAL_MS` - reconciliation tick in milliseconds
    ///   (default: 1000)
    pub fn from_env() -> Self {
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            reconcile_interval: env::var("RECONCILE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(1)),
        }
    }

    /// An unbounded cache (no LRU) with the default one-second tick.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// An LRU-bounded cache with the default one-second tick.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            reconcile_interval: Duration::from_secs(1),
        }
    }
}
