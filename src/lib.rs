//! Tickcache - a concurrent in-process cache engine
//!
//! Provides a key-value store with per-entry TTL expiration and optional
//! capacity-bounded LRU eviction. Expiration is tracked in one-second time
//! buckets and all index maintenance happens in a single periodic background
//! task, keeping the hot get/set path free of auxiliary locking.
//!
//! ```no_run
//! use std::time::Duration;
//! use tickcache::{Cache, CacheConfig, Expiry};
//!
//! # #[tokio::main] async fn main() {
//! let cache: Cache<String, i32> = Cache::new(CacheConfig::with_capacity(1000));
//! cache.set("answer".into(), 42, Expiry::After(Duration::from_secs(5))).unwrap();
//! assert_eq!(cache.get(&"answer".into()), Some(42));
//! cache.close();
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub(crate) mod tasks;

pub use cache::{Cache, CacheEvent, Expiry, StatsSnapshot};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
