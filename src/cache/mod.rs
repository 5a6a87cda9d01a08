//! Cache Module
//!
//! Provides concurrent in-memory caching with per-entry TTL expiration and
//! optional LRU eviction. Expiration uses one-second time buckets swept by a
//! background task, trading exact-millisecond precision for throughput.

mod entry;
mod expire;
pub(crate) mod facade;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use expire::{bucket_of, ExpireIndex};
pub use facade::{Cache, CacheEvent, Expiry};
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CacheStore, LockCheckOutcome, ValueSource};

pub(crate) use entry::now_millis;
pub(crate) use expire::sweep_window;

// == Public Constants ==
/// Expiration timestamp marking entries that never expire (milliseconds).
pub const NEVER_EXPIRE_MS: i64 = i64::MAX / 1_000_000;

/// Width of one expiration bucket in milliseconds.
pub const BUCKET_SPAN_MS: i64 = 1000;

/// How many elapsed buckets each sweep inspects. A fixed lookback window
/// tolerating clock and event-queue lag; buckets older than this are never
/// revisited.
pub const SWEEP_LOOKBACK_BUCKETS: usize = 5;
