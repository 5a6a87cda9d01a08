//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the store, bucket, index, and LRU invariants.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::entry::now_millis;
use crate::cache::expire::{bucket_of, ExpireIndex};
use crate::cache::lru::LruTracker;
use crate::cache::store::CacheStore;
use crate::cache::BUCKET_SPAN_MS;

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

/// Generates a sequence of store operations for testing
#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Remove { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* valid key-value pair, storing the pair and then retrieving it
    // before expiration returns the exact value that was stored.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new();
        store.insert(key.clone(), value.clone(), now_millis() + 60_000);

        let entry = store.get_valid(&key);
        prop_assert!(entry.is_some());
        prop_assert_eq!(&entry.unwrap().value, &value);
    }

    // *For any* key, storing V1 and then V2 results in reads observing V2,
    // with exactly one live entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let mut store = CacheStore::new();
        store.insert(key.clone(), value1, now_millis() + 60_000);
        store.insert(key.clone(), value2.clone(), now_millis() + 60_000);

        prop_assert_eq!(&store.get_valid(&key).unwrap().value, &value2);
        prop_assert_eq!(store.size(), 1);
    }

    // *For any* sequence of sets and removes, the store mirrors a plain map:
    // the last write wins and removed keys are absent.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = CacheStore::new();
        let mut model = std::collections::HashMap::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.insert(key.clone(), value.clone(), now_millis() + 60_000);
                    model.insert(key, value);
                }
                StoreOp::Remove { key } => {
                    let removed = store.remove(&key);
                    prop_assert_eq!(removed, model.remove(&key));
                }
            }
        }

        prop_assert_eq!(store.size(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(&store.get_valid(key).unwrap().value, value);
        }
    }

    // *For any* timestamp, the bucket lands on a whole-second boundary
    // strictly after it, at most two seconds away; bucketing is monotone.
    #[test]
    fn prop_bucket_quantization(ms in 0i64..9_000_000_000_000, later in 0i64..100_000) {
        let bucket = bucket_of(ms);
        prop_assert_eq!(bucket % BUCKET_SPAN_MS, 0);
        prop_assert!(bucket > ms);
        prop_assert!(bucket <= ms + 2 * BUCKET_SPAN_MS);
        prop_assert!(bucket_of(ms + later) >= bucket);
    }

    // *For any* sequence of reconcile events, each indexed key lives in
    // exactly one bucket and the bucket sets partition the key space.
    #[test]
    fn prop_index_partitions_keys(
        events in prop::collection::vec((key_strategy(), 0i64..600_000), 1..80)
    ) {
        let mut index = ExpireIndex::new();
        let mut keys = HashSet::new();
        for (key, expire_at) in &events {
            index.reconcile(key, *expire_at);
            keys.insert(key.clone());
        }

        prop_assert_eq!(index.tracked(), keys.len());

        let mut seen = HashSet::new();
        for bucket in 0..=bucket_of(600_000) / BUCKET_SPAN_MS {
            if let Some(set) = index.take_bucket(bucket * BUCKET_SPAN_MS) {
                for key in set {
                    // Disjointness: no key appears in two buckets.
                    prop_assert!(seen.insert(key));
                }
            }
        }
        prop_assert_eq!(seen, keys);
    }

    // *For any* touch sequence with per-touch eviction (the reconciliation
    // task's discipline), the tracked count never exceeds the capacity and
    // evicted keys are always the coldest.
    #[test]
    fn prop_lru_capacity_enforcement(
        touches in prop::collection::vec(key_strategy(), 1..100),
        capacity in 1usize..10
    ) {
        let mut lru = LruTracker::new(capacity);
        let mut recency: Vec<String> = Vec::new();

        for key in touches {
            lru.touch(key.clone());
            recency.retain(|k| k != &key);
            recency.push(key);

            if let Some(evicted) = lru.evict_if_over_capacity() {
                prop_assert_eq!(&evicted, &recency[0], "must evict the coldest key");
                recency.remove(0);
            }
            prop_assert!(lru.len() <= capacity);
            prop_assert_eq!(lru.len(), recency.len());
        }

        prop_assert_eq!(lru.coldest(), recency.first());
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    // *For any* entry stored with an already elapsed timestamp, every read
    // and enumeration treats it as absent even though it is physically
    // present until swept.
    #[test]
    fn prop_lazy_expiry_invisibility(
        key in key_strategy(),
        value in value_strategy(),
        elapsed in 1i64..1_000_000
    ) {
        let mut store = CacheStore::new();
        store.insert(key.clone(), value, now_millis() - elapsed);

        prop_assert!(store.get_valid(&key).is_none());
        prop_assert_eq!(store.size(), 0);
        prop_assert!(store.keys().is_empty());
        prop_assert!(store.values().is_empty());
        prop_assert_eq!(store.physical_len(), 1);
    }
}
