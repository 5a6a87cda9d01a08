//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.
//! Counters are atomic so the read path can record hits under the store's
//! shared lock while the reconciliation task records evictions concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live performance counters, shared between callers and the background task.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Successful retrievals
    hits: AtomicU64,
    /// Failed retrievals (key absent or lazily expired)
    misses: AtomicU64,
    /// Entries evicted by the LRU policy
    evictions: AtomicU64,
    /// Entries physically removed by the expiration sweep
    expired: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Recording ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the eviction counter.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `count` sweep removals to the expired counter.
    pub fn record_expired(&self, count: u64) {
        self.expired.fetch_add(count, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Point-in-time copy of the counters, paired with the current live entry
    /// count supplied by the caller.
    pub fn snapshot(&self, entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            entries,
        }
    }
}

// == Stats Snapshot ==
/// Serializable view of the counters at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// Number of entries evicted due to the LRU policy
    pub evictions: u64,
    /// Number of entries removed by the expiration sweep
    pub expired: u64,
    /// Current number of live entries in the cache
    pub entries: usize,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no retrievals happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let snapshot = CacheStats::new().snapshot(0);
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.expired, 0);
        assert_eq!(snapshot.entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let snapshot = CacheStats::new().snapshot(0);
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot(1).hit_rate(), 0.5);
    }

    #[test]
    fn test_record_eviction_and_expired() {
        let stats = CacheStats::new();
        stats.record_eviction();
        stats.record_eviction();
        stats.record_expired(3);

        let snapshot = stats.snapshot(7);
        assert_eq!(snapshot.evictions, 2);
        assert_eq!(snapshot.expired, 3);
        assert_eq!(snapshot.entries, 7);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = CacheStats::new();
        stats.record_hit();

        let json = serde_json::to_value(stats.snapshot(1)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["entries"], 1);
    }
}
