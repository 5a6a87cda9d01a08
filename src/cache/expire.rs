//! Expiration Index Module
//!
//! Maps keys to one-second expiration buckets so that the periodic sweep
//! inspects a handful of buckets per cycle instead of scanning the whole
//! store.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::cache::{BUCKET_SPAN_MS, SWEEP_LOOKBACK_BUCKETS};

// == Bucket Quantization ==
/// Quantizes a millisecond timestamp up to the next whole-second boundary.
///
/// The returned bucket id is always strictly greater than `expire_ms`, so a
/// key can never be swept before it has actually expired: by the time the
/// sweep visits a bucket, every timestamp grouped into it has elapsed.
pub fn bucket_of(expire_ms: i64) -> i64 {
    (expire_ms / BUCKET_SPAN_MS + 1) * BUCKET_SPAN_MS
}

/// Bucket ids the sweep should visit at time `now_ms`: the one-second buckets
/// immediately preceding the current one. The window is a fixed lookback that
/// tolerates event-queue lag; buckets older than it are never revisited.
pub fn sweep_window(now_ms: i64) -> [i64; SWEEP_LOOKBACK_BUCKETS] {
    let head = bucket_of(now_ms);
    std::array::from_fn(|i| head - (i as i64 + 1) * BUCKET_SPAN_MS)
}

// == Expiration Index ==
/// The two auxiliary expiration structures: key -> current bucket, and
/// bucket -> set of keys believed to expire within it.
///
/// Written exclusively by the reconciliation task, which is why it carries no
/// lock of its own.
#[derive(Debug)]
pub struct ExpireIndex<K> {
    /// Current bucket of every indexed key
    times: HashMap<K, i64>,
    /// Keys grouped by expiration bucket
    buckets: HashMap<i64, HashSet<K>>,
}

impl<K> Default for ExpireIndex<K> {
    fn default() -> Self {
        Self {
            times: HashMap::new(),
            buckets: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> ExpireIndex<K> {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Reconcile ==
    /// Applies one write event: moves `key` into the bucket of `expire_at`.
    ///
    /// A no-op when the bucket is unchanged. Otherwise the key is added to the
    /// new bucket, removed from the old one, and the key -> bucket entry is
    /// updated, all in the same call so the two structures never disagree.
    pub fn reconcile(&mut self, key: &K, expire_at: i64) {
        let new_bucket = bucket_of(expire_at);
        let old_bucket = self.times.get(key).copied();
        if old_bucket == Some(new_bucket) {
            return;
        }
        self.buckets
            .entry(new_bucket)
            .or_default()
            .insert(key.clone());
        if let Some(old) = old_bucket {
            if let Some(set) = self.buckets.get_mut(&old) {
                set.remove(key);
            }
        }
        self.times.insert(key.clone(), new_bucket);
    }

    // == Take Bucket ==
    /// Removes and returns the key set of `bucket`, if any.
    ///
    /// The sweep consumes a bucket wholesale; buckets are never revisited.
    pub fn take_bucket(&mut self, bucket: i64) -> Option<HashSet<K>> {
        self.buckets.remove(&bucket)
    }

    // == Forget ==
    /// Drops the key -> bucket entry for `key`.
    ///
    /// Any stale membership in an old bucket set is left behind on purpose; it
    /// is discarded when that bucket is eventually swept, and the sweep
    /// double-checks against the store before deleting anything.
    pub fn forget(&mut self, key: &K) {
        self.times.remove(key);
    }

    // == Tracked ==
    /// Number of keys currently indexed.
    pub fn tracked(&self) -> usize {
        self.times.len()
    }
}
