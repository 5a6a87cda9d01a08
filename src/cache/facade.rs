//! Cache Facade Module
//!
//! The public operation surface of the engine: a concurrent key-value cache
//! composing the store, the event queue, and the background reconciliation
//! task. Mutations touch the store synchronously and push a lightweight
//! event; the auxiliary expiration and LRU structures catch up once per tick.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::cache::entry::now_millis;
use crate::cache::stats::{CacheStats, StatsSnapshot};
use crate::cache::store::{CacheStore, LockCheckOutcome, ValueSource};
use crate::cache::{BUCKET_SPAN_MS, NEVER_EXPIRE_MS};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reconcile_task;

// == Expiry ==
/// Requested or remaining lifetime of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires
    Never,
    /// The entry expires once this duration has elapsed
    After(Duration),
    /// The entry is treated as already expired; setting a key with this
    /// makes it invisible immediately and the sweep deletes it later
    Expired,
}

impl Expiry {
    /// Absolute expiration timestamp in Unix milliseconds.
    pub(crate) fn timestamp(self) -> i64 {
        match self {
            Expiry::Never => NEVER_EXPIRE_MS,
            Expiry::After(d) => now_millis() + d.as_millis() as i64,
            Expiry::Expired => now_millis() - BUCKET_SPAN_MS,
        }
    }
}

impl From<Duration> for Expiry {
    /// A zero duration means "never expires", mirroring the classic cache
    /// convention of 0 = no TTL.
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Expiry::Never
        } else {
            Expiry::After(d)
        }
    }
}

// == Cache Event ==
/// An index-maintenance fact: as of this event, `key` expires at `expire_at`.
/// Removals are represented by an already elapsed timestamp.
#[derive(Debug, Clone)]
pub struct CacheEvent<K> {
    /// The key the event concerns
    pub key: K,
    /// The key's expiration timestamp at the time of the event (Unix ms)
    pub expire_at: i64,
}

// == Shared State ==
/// State shared between the facade and the reconciliation task.
pub(crate) struct Shared<K, V> {
    /// The authoritative store, behind the only external-writer-safe lock
    pub(crate) store: RwLock<CacheStore<K, V>>,
    /// Performance counters
    pub(crate) stats: CacheStats,
    /// LRU capacity; 0 disables LRU tracking entirely
    pub(crate) capacity: usize,
    /// Producer side of the event queue
    events: UnboundedSender<CacheEvent<K>>,
    /// Producer side of the read-touch list
    read_touches: UnboundedSender<K>,
    /// Set once by `close`
    closed: AtomicBool,
    /// Wakes the reconciliation task out of its tick sleep on close
    pub(crate) close_signal: Notify,
}

impl<K, V> Shared<K, V> {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Marks the cache closed and wakes the task. Idempotent.
    pub(crate) fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.close_signal.notify_one();
        }
    }

    /// Hands an event to the reconciliation task. Once the task has exited
    /// the receiver is gone and late events are simply dropped.
    fn push_event(&self, key: K, expire_at: i64) {
        let _ = self.events.send(CacheEvent { key, expire_at });
    }

    /// Records a read for LRU recency without taking any lock.
    fn push_read_touch(&self, key: K) {
        if self.capacity > 0 {
            let _ = self.read_touches.send(key);
        }
    }
}

// == Cache ==
/// Concurrent in-process cache with per-entry TTL and optional LRU eviction.
///
/// Construction spawns a single background reconciliation task, the sole
/// writer of the expiration index and the LRU tracker; [`Cache::close`]
/// stops it. Must be created inside a tokio runtime.
///
/// The store is immediately consistent: a `get` right after a `set` reflects
/// the new value and expiry even before the task has run. Only the auxiliary
/// indexes are eventually consistent, bounded by the reconcile interval.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its reconciliation task.
    pub fn new(config: CacheConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (touch_tx, touch_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            store: RwLock::new(CacheStore::new()),
            stats: CacheStats::new(),
            capacity: config.capacity,
            events: event_tx,
            read_touches: touch_tx,
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        });
        let worker = spawn_reconcile_task(
            Arc::clone(&shared),
            event_rx,
            touch_rx,
            config.reconcile_interval,
        );
        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.is_closed() {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    // == Set ==
    /// Stores `key` with `value`, replacing any previous entry and its TTL.
    pub fn set(&self, key: K, value: V, expiry: Expiry) -> Result<()> {
        self.ensure_open()?;
        let expire_at = expiry.timestamp();
        self.shared.store.write().insert(key.clone(), value, expire_at);
        self.shared.push_event(key, expire_at);
        Ok(())
    }

    /// Batch form of [`Cache::set`]: stores every pair with the same expiry.
    pub fn set_many(&self, pairs: impl IntoIterator<Item = (K, V)>, expiry: Expiry) -> Result<()> {
        self.ensure_open()?;
        let expire_at = expiry.timestamp();
        for (key, value) in pairs {
            self.shared.store.write().insert(key.clone(), value, expire_at);
            self.shared.push_event(key, expire_at);
        }
        Ok(())
    }

    // == Get ==
    /// The value of `key`, or `None` if absent or expired. Absence is never
    /// an error. A hit records LRU recency asynchronously.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = {
            let store = self.shared.store.read();
            store.get_valid(key).map(|entry| entry.value.clone())
        };
        match value {
            Some(value) => {
                self.shared.stats.record_hit();
                self.shared.push_read_touch(key.clone());
                Some(value)
            }
            None => {
                self.shared.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        let found = self.shared.store.read().get_valid(key).is_some();
        if found {
            self.shared.push_read_touch(key.clone());
        }
        found
    }

    // == Get Or Set ==
    /// Returns the value of `key`, or stores and returns `value` if the key
    /// is absent.
    pub fn get_or_set(&self, key: K, value: V, expiry: Expiry) -> Result<V> {
        if let Some(existing) = self.get(&key) {
            return Ok(existing);
        }
        let fallback = value.clone();
        match self.set_with_lock_check(key, ValueSource::Literal(value), expiry)? {
            LockCheckOutcome::Existing(v) | LockCheckOutcome::Stored(v) => Ok(v),
            LockCheckOutcome::Skipped => Ok(fallback),
        }
    }

    /// Like [`Cache::get_or_set`], but the value comes from `f`, evaluated
    /// outside any lock. Returns `Ok(None)` when the generator yields no
    /// value; the key then stays absent. Generator errors propagate and
    /// leave the key untouched.
    pub fn get_or_set_func<F>(&self, key: K, f: F, expiry: Expiry) -> Result<Option<V>>
    where
        F: FnOnce() -> anyhow::Result<Option<V>>,
    {
        if let Some(existing) = self.get(&key) {
            return Ok(Some(existing));
        }
        match f().map_err(CacheError::Generator)? {
            Some(value) => self
                .set_with_lock_check(key, ValueSource::Literal(value), expiry)
                .map(LockCheckOutcome::into_value),
            None => Ok(None),
        }
    }

    /// Like [`Cache::get_or_set_func`], but `f` runs while the store's write
    /// lock is held, so it executes at most once per key even under
    /// concurrent callers. A slow generator blocks other writers to this
    /// store for its whole run; that is the accepted price of the
    /// at-most-once guarantee.
    pub fn get_or_set_func_lock<F>(&self, key: K, f: F, expiry: Expiry) -> Result<Option<V>>
    where
        F: FnOnce() -> anyhow::Result<Option<V>>,
    {
        if let Some(existing) = self.get(&key) {
            return Ok(Some(existing));
        }
        self.set_with_lock_check(key, ValueSource::Generator(Box::new(f)), expiry)
            .map(LockCheckOutcome::into_value)
    }

    // == Set If Not Exist ==
    /// Stores `key` only if absent. Returns whether the key was newly
    /// created.
    pub fn set_if_not_exist(&self, key: K, value: V, expiry: Expiry) -> Result<bool> {
        if self.contains(&key) {
            return Ok(false);
        }
        let outcome = self.set_with_lock_check(key, ValueSource::Literal(value), expiry)?;
        Ok(matches!(outcome, LockCheckOutcome::Stored(_)))
    }

    /// Like [`Cache::set_if_not_exist`] with the value generated by `f`,
    /// evaluated outside any lock.
    pub fn set_if_not_exist_func<F>(&self, key: K, f: F, expiry: Expiry) -> Result<bool>
    where
        F: FnOnce() -> anyhow::Result<Option<V>>,
    {
        if self.contains(&key) {
            return Ok(false);
        }
        match f().map_err(CacheError::Generator)? {
            Some(value) => {
                let outcome = self.set_with_lock_check(key, ValueSource::Literal(value), expiry)?;
                Ok(matches!(outcome, LockCheckOutcome::Stored(_)))
            }
            None => Ok(false),
        }
    }

    /// Like [`Cache::set_if_not_exist_func`], but `f` runs under the store's
    /// write lock with the same at-most-once guarantee as
    /// [`Cache::get_or_set_func_lock`].
    pub fn set_if_not_exist_func_lock<F>(&self, key: K, f: F, expiry: Expiry) -> Result<bool>
    where
        F: FnOnce() -> anyhow::Result<Option<V>>,
    {
        if self.contains(&key) {
            return Ok(false);
        }
        let outcome =
            self.set_with_lock_check(key, ValueSource::Generator(Box::new(f)), expiry)?;
        Ok(matches!(outcome, LockCheckOutcome::Stored(_)))
    }

    // == Update ==
    /// Replaces the value of `key` while preserving its expiration. Returns
    /// the old value, or `None` when the key is not present.
    pub fn update(&self, key: &K, value: V) -> Result<Option<V>> {
        self.ensure_open()?;
        Ok(self.shared.store.write().update(key, value))
    }

    /// Replaces the expiration of `key` while preserving its value. Returns
    /// the old remaining expiry, or `None` when the key is not present.
    pub fn update_expire(&self, key: &K, expiry: Expiry) -> Result<Option<Expiry>> {
        self.ensure_open()?;
        let expire_at = expiry.timestamp();
        let old = self.shared.store.write().update_expire(key, expire_at);
        match old {
            Some(old_expire_at) => {
                self.shared.push_event(key.clone(), expire_at);
                Ok(Some(remaining_expiry(old_expire_at)))
            }
            None => Ok(None),
        }
    }

    // == Get Expire ==
    /// Remaining expiry of `key`: `None` when the key is absent or expired,
    /// [`Expiry::Never`] for entries without a TTL, otherwise the time left.
    pub fn get_expire(&self, key: &K) -> Option<Expiry> {
        let store = self.shared.store.read();
        store
            .get_valid(key)
            .map(|entry| remaining_expiry(entry.expire_at))
    }

    // == Remove ==
    /// Deletes `key` and returns its value. Removing an absent key is a
    /// no-op returning `None`.
    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        self.ensure_open()?;
        Ok(self.remove_one(key))
    }

    /// Deletes every key in `keys`, returning the value of the last one that
    /// was present.
    pub fn remove_many(&self, keys: &[K]) -> Result<Option<V>> {
        self.ensure_open()?;
        let mut last = None;
        for key in keys {
            if let Some(value) = self.remove_one(key) {
                last = Some(value);
            }
        }
        Ok(last)
    }

    fn remove_one(&self, key: &K) -> Option<V> {
        let removed = self.shared.store.write().remove(key);
        if removed.is_some() {
            // An already elapsed timestamp tells the reconciler the key is
            // gone; its index entries are cleaned up on the next sweep.
            self.shared.push_event(key.clone(), now_millis() - BUCKET_SPAN_MS);
        }
        removed
    }

    // == Enumeration ==
    /// Number of live entries, filtering out expired ones at enumeration
    /// time.
    pub fn size(&self) -> usize {
        self.shared.store.read().size()
    }

    /// Copy of all live key-value pairs.
    pub fn data(&self) -> HashMap<K, V> {
        self.shared.store.read().data()
    }

    /// All live keys.
    pub fn keys(&self) -> Vec<K> {
        self.shared.store.read().keys()
    }

    /// All live values.
    pub fn values(&self) -> Vec<V> {
        self.shared.store.read().values()
    }

    // == Clear ==
    /// Drops every entry. The auxiliary indexes catch up through the sweep.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        self.shared.store.write().clear();
        Ok(())
    }

    // == Close ==
    /// Stops the reconciliation task. Idempotent; afterwards mutating calls
    /// return [`CacheError::Closed`] and reads answer from the store as-is.
    pub fn close(&self) {
        self.shared.close();
        if let Some(handle) = self.worker.lock().take() {
            // The task notices the close signal and runs one final pass on
            // its own; the handle is only detached here.
            drop(handle);
        }
    }

    // == Stats ==
    /// Point-in-time performance counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot(self.size())
    }

    /// The double-checked write path shared by the `get_or_set*` and
    /// `set_if_not_exist*` families.
    fn set_with_lock_check(
        &self,
        key: K,
        source: ValueSource<'_, V>,
        expiry: Expiry,
    ) -> Result<LockCheckOutcome<V>> {
        self.ensure_open()?;
        let expire_at = expiry.timestamp();
        let outcome = {
            let mut store = self.shared.store.write();
            store
                .set_with_lock_check(key.clone(), source, expire_at)
                .map_err(CacheError::Generator)?
        };
        if matches!(outcome, LockCheckOutcome::Stored(_)) {
            self.shared.push_event(key, expire_at);
        }
        Ok(outcome)
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl<V> LockCheckOutcome<V> {
    /// Collapses the outcome into the value the caller observes.
    fn into_value(self) -> Option<V> {
        match self {
            LockCheckOutcome::Existing(v) | LockCheckOutcome::Stored(v) => Some(v),
            LockCheckOutcome::Skipped => None,
        }
    }
}

/// Converts an absolute expiration timestamp back into a remaining expiry.
fn remaining_expiry(expire_at: i64) -> Expiry {
    if expire_at == NEVER_EXPIRE_MS {
        Expiry::Never
    } else {
        Expiry::After(Duration::from_millis((expire_at - now_millis()).max(0) as u64))
    }
}
