//! Cache Store Module
//!
//! The authoritative hash table of key -> (value, expiration timestamp). All
//! reads ultimately check this table and apply the lazy expiry rule; the
//! physical deletion of expired entries is left to the reconciliation task's
//! sweep.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::entry::CacheEntry;

// == Value Source ==
/// A literal value or a deferred generator, resolved at most once while the
/// store's write lock is held.
pub enum ValueSource<'f, V> {
    /// A ready value
    Literal(V),
    /// A zero-argument producer; `Ok(None)` means "store nothing"
    Generator(Box<dyn FnOnce() -> anyhow::Result<Option<V>> + 'f>),
}

impl<'f, V> ValueSource<'f, V> {
    /// Produces the value. Literal sources always yield one; generators may
    /// decline or fail.
    fn resolve(self) -> anyhow::Result<Option<V>> {
        match self {
            ValueSource::Literal(value) => Ok(Some(value)),
            ValueSource::Generator(f) => f(),
        }
    }
}

impl<V> std::fmt::Debug for ValueSource<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Literal(_) => f.write_str("ValueSource::Literal"),
            ValueSource::Generator(_) => f.write_str("ValueSource::Generator"),
        }
    }
}

// == Lock-Check Outcome ==
/// What a double-checked write found or did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCheckOutcome<V> {
    /// A live entry already existed; its value is returned untouched
    Existing(V),
    /// The value was produced and stored
    Stored(V),
    /// The generator yielded no value; the key remains absent
    Skipped,
}

// == Cache Store ==
/// Hash-table storage with lazy TTL filtering.
///
/// The store itself is a plain data structure; the facade wraps it in a
/// read-write lock and the reconciliation task performs the physical cleanup.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    data: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for CacheStore<K, V> {
    fn default() -> Self {
        Self {
            data: HashMap::new(),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Stores `key` with `value` expiring at `expire_at`, replacing any
    /// previous entry.
    pub fn insert(&mut self, key: K, value: V, expire_at: i64) {
        self.data.insert(key, CacheEntry::new(value, expire_at));
    }

    // == Get ==
    /// The live entry for `key`: present and not lazily expired.
    pub fn get_valid(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.data.get(key).filter(|entry| !entry.is_expired())
    }

    // == Update ==
    /// Replaces the value of `key` while preserving its expiration, returning
    /// the old value. Does nothing if the key is not physically present.
    pub fn update(&mut self, key: &K, value: V) -> Option<V> {
        self.data
            .get_mut(key)
            .map(|entry| std::mem::replace(&mut entry.value, value))
    }

    // == Update Expire ==
    /// Replaces the expiration of `key` while preserving its value, returning
    /// the old expiration timestamp. Does nothing if the key is not present.
    pub fn update_expire(&mut self, key: &K, expire_at: i64) -> Option<i64> {
        self.data
            .get_mut(key)
            .map(|entry| std::mem::replace(&mut entry.expire_at, expire_at))
    }

    // == Remove ==
    /// Deletes `key` unconditionally and returns its value, bypassing the
    /// expiry check. Used for explicit removal and forced LRU eviction alike.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.data.remove(key).map(|entry| entry.value)
    }

    /// Deletes `key` only if it is still expired, returning whether an entry
    /// was removed. The sweep uses this double check so that a key re-set
    /// after its event was enqueued is not lost.
    pub fn remove_expired(&mut self, key: &K) -> bool {
        match self.data.get(key) {
            Some(entry) if entry.is_expired() => {
                self.data.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Set With Lock Check ==
    /// The at-most-one-writer path: re-checks existence under the caller-held
    /// write lock and resolves `source` only if the key is absent or expired.
    ///
    /// A generator therefore runs at most once per key across concurrent
    /// callers; if it yields no value, nothing is stored.
    pub fn set_with_lock_check(
        &mut self,
        key: K,
        source: ValueSource<'_, V>,
        expire_at: i64,
    ) -> anyhow::Result<LockCheckOutcome<V>> {
        if let Some(entry) = self.get_valid(&key) {
            return Ok(LockCheckOutcome::Existing(entry.value.clone()));
        }
        match source.resolve()? {
            Some(value) => {
                self.data
                    .insert(key, CacheEntry::new(value.clone(), expire_at));
                Ok(LockCheckOutcome::Stored(value))
            }
            None => Ok(LockCheckOutcome::Skipped),
        }
    }

    // == Enumeration ==
    /// Number of live entries, filtering out lazily expired ones.
    pub fn size(&self) -> usize {
        self.data.values().filter(|entry| !entry.is_expired()).count()
    }

    /// Copy of all live key-value pairs.
    pub fn data(&self) -> HashMap<K, V> {
        self.data
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// All live keys.
    pub fn keys(&self) -> Vec<K> {
        self.data
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// All live values.
    pub fn values(&self) -> Vec<V> {
        self.data
            .values()
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
            .collect()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    // == Physical Length ==
    /// Physical entry count, including lazily expired entries awaiting the
    /// sweep.
    pub fn physical_len(&self) -> usize {
        self.data.len()
    }
}
