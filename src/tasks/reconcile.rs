//! Reconciliation Task
//!
//! The single periodic background task per cache instance. Each tick it
//! drains the event queue into the expiration index, drains the read-touch
//! list into the LRU tracker, evicts over-capacity keys, and sweeps the
//! elapsed expiration buckets. It is the only writer of the index and the
//! tracker, which is why neither carries a lock.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::facade::{CacheEvent, Shared};
use crate::cache::{now_millis, sweep_window, ExpireIndex, LruTracker};

/// Spawns the reconciliation loop for one cache instance.
///
/// The loop wakes once per `interval` (and immediately on close), processes
/// pending events and touches, then sweeps. On close it performs one final
/// drain-and-sweep pass before terminating.
pub(crate) fn spawn_reconcile_task<K, V>(
    shared: Arc<Shared<K, V>>,
    mut events: UnboundedReceiver<CacheEvent<K>>,
    mut read_touches: UnboundedReceiver<K>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            capacity = shared.capacity,
            "reconcile task started"
        );

        let mut index = ExpireIndex::new();
        let mut lru = LruTracker::new(shared.capacity);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // A tokio interval yields its first tick immediately; consume it so
        // the first real cycle happens one interval from now.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shared.close_signal.notified() => {}
            }
            let closing = shared.is_closed();

            drain_events(&shared, &mut events, &mut index, &mut lru);
            drain_read_touches(&shared, &mut read_touches, &mut index, &mut lru);
            sweep(&shared, &mut index, &mut lru);

            if closing {
                info!("reconcile task stopped");
                break;
            }
        }
    })
}

/// Drains the event queue: every event updates the expiration index, and a
/// write counts as an LRU touch.
fn drain_events<K, V>(
    shared: &Shared<K, V>,
    events: &mut UnboundedReceiver<CacheEvent<K>>,
    index: &mut ExpireIndex<K>,
    lru: &mut LruTracker<K>,
) where
    K: Clone + Eq + Hash,
    V: Clone,
{
    while let Ok(event) = events.try_recv() {
        index.reconcile(&event.key, event.expire_at);
        touch_and_evict(shared, index, lru, event.key);
    }
}

/// Drains the read-touch list accumulated by `get` calls since the last
/// tick. Recency precision is bounded by the tick interval on purpose; it
/// keeps the read path free of LRU locking.
fn drain_read_touches<K, V>(
    shared: &Shared<K, V>,
    read_touches: &mut UnboundedReceiver<K>,
    index: &mut ExpireIndex<K>,
    lru: &mut LruTracker<K>,
) where
    K: Clone + Eq + Hash,
    V: Clone,
{
    while let Ok(key) = read_touches.try_recv() {
        touch_and_evict(shared, index, lru, key);
    }
}

/// Records one LRU touch and, if the tracker went over capacity, force
/// deletes the coldest key from the store. This is the eviction path,
/// independent of TTL expiration.
fn touch_and_evict<K, V>(
    shared: &Shared<K, V>,
    index: &mut ExpireIndex<K>,
    lru: &mut LruTracker<K>,
    key: K,
) where
    K: Clone + Eq + Hash,
    V: Clone,
{
    if shared.capacity == 0 {
        return;
    }
    lru.touch(key);
    if let Some(coldest) = lru.evict_if_over_capacity() {
        shared.store.write().remove(&coldest);
        index.forget(&coldest);
        shared.stats.record_eviction();
        debug!("evicted least recently used key");
    }
}

/// Deletes TTL-expired keys found via the elapsed expiration buckets. Each
/// removal is double-checked against the store, so a key re-set after its
/// event was enqueued survives.
fn sweep<K, V>(shared: &Shared<K, V>, index: &mut ExpireIndex<K>, lru: &mut LruTracker<K>)
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    let mut removed = 0u64;
    for bucket in sweep_window(now_millis()) {
        if let Some(keys) = index.take_bucket(bucket) {
            for key in keys {
                if shared.store.write().remove_expired(&key) {
                    removed += 1;
                }
                index.forget(&key);
                lru.remove(&key);
            }
        }
    }
    if removed > 0 {
        shared.stats.record_expired(removed);
        debug!(removed, "sweep removed expired entries");
    }
}
