//! Cache Entry Module
//!
//! Defines the value-plus-expiration pair owned by the cache store.

use chrono::Utc;

use crate::cache::NEVER_EXPIRE_MS;

// == Cache Entry ==
/// A stored value together with its absolute expiration timestamp.
///
/// Entries are owned exclusively by the [`CacheStore`](crate::cache::CacheStore)
/// and mutated only through store operations under its lock.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiration timestamp (Unix milliseconds).
    /// `NEVER_EXPIRE_MS` marks entries without a TTL.
    pub expire_at: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring at the given absolute timestamp.
    pub fn new(value: V, expire_at: i64) -> Self {
        Self { value, expire_at }
    }

    // == Is Expired ==
    /// Lazy expiry check: an entry is expired once the current time is greater
    /// than or equal to its expiration timestamp. A logically expired entry is
    /// invisible to readers even while physically present, until the sweep
    /// removes it.
    pub fn is_expired(&self) -> bool {
        now_millis() >= self.expire_at
    }

    // == Never Expires ==
    /// Whether the entry carries no TTL at all.
    pub fn never_expires(&self) -> bool {
        self.expire_at == NEVER_EXPIRE_MS
    }

    // == Remaining ==
    /// Remaining lifetime in milliseconds.
    ///
    /// Returns `None` for entries without a TTL and `Some(0)` once the TTL has
    /// fully elapsed.
    pub fn remaining_ms(&self) -> Option<i64> {
        if self.never_expires() {
            None
        } else {
            Some((self.expire_at - now_millis()).max(0))
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
