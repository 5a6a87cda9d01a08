//! LRU Tracker Module
//!
//! Recency list for capacity-bounded eviction. The tracker is owned by the
//! reconciliation task alone, never touched from the read path, so it needs
//! no locking; readers instead enqueue touch events that the task drains
//! once per tick.

use std::collections::HashMap;
use std::hash::Hash;

// == List Node ==
/// Doubly linked list node held in a slab; slot indices stand in for
/// pointers.
#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks key recency: the front of the list is the most recently touched
/// key, the back is the eviction candidate. A key -> slot index gives O(1)
/// touch and removal; freed slots are recycled through a free list.
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Eviction threshold; 0 disables the tracker entirely
    capacity: usize,
    /// Slab of list nodes, `None` for free slots
    slots: Vec<Option<Node<K>>>,
    /// Recycled slot indices
    free: Vec<usize>,
    /// Key to slot index for O(1) lookup
    index: HashMap<K, usize>,
    /// Most recently touched
    head: Option<usize>,
    /// Least recently touched
    tail: Option<usize>,
}

impl<K: Clone + Eq + Hash> LruTracker<K> {
    // == Constructor ==
    /// Creates a tracker bounded by `capacity` keys. A capacity of 0 means
    /// the tracker never evicts.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    // == Touch ==
    /// Marks `key` as most recently used, creating its node if absent.
    pub fn touch(&mut self, key: K) {
        if let Some(&slot) = self.index.get(&key) {
            self.unlink(slot);
            self.push_front(slot);
            return;
        }
        let node = Node {
            key: key.clone(),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_front(slot);
    }

    // == Evict ==
    /// Pops and returns the coldest key if the tracked count exceeds the
    /// capacity, or `None` otherwise.
    pub fn evict_if_over_capacity(&mut self) -> Option<K> {
        if self.capacity == 0 || self.index.len() <= self.capacity {
            return None;
        }
        let slot = self.tail?;
        self.unlink(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.index.remove(&node.key);
        Some(node.key)
    }

    // == Remove ==
    /// Drops `key` from the tracker. Used whenever a key leaves the cache,
    /// whether by explicit removal, eviction, or the expiration sweep.
    pub fn remove(&mut self, key: &K) {
        if let Some(slot) = self.index.remove(key) {
            self.unlink(slot);
            self.slots[slot] = None;
            self.free.push(slot);
        }
    }

    // == Length ==
    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Coldest ==
    /// The current eviction candidate, without removing it.
    pub fn coldest(&self) -> Option<&K> {
        self.tail
            .and_then(|slot| self.slots[slot].as_ref())
            .map(|node| &node.key)
    }

    // == List Plumbing ==
    /// Detaches the node in `slot` from the list, fixing up its neighbors
    /// and the head/tail pointers.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match &self.slots[slot] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    /// Links the detached node in `slot` at the front of the list.
    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.slots[h].as_mut() {
                node.prev = Some(slot);
            }
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru: LruTracker<&str> = LruTracker::new(3);
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.coldest(), None);
    }

    #[test]
    fn test_lru_touch_order() {
        let mut lru = LruTracker::new(10);

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.coldest(), Some(&"key1"));
    }

    #[test]
    fn test_lru_touch_existing_moves_to_front() {
        let mut lru = LruTracker::new(10);

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.coldest(), Some(&"key2"));
    }

    #[test]
    fn test_lru_evict_only_over_capacity() {
        let mut lru = LruTracker::new(2);

        lru.touch("a");
        lru.touch("b");
        assert_eq!(lru.evict_if_over_capacity(), None);

        lru.touch("c");
        assert_eq!(lru.evict_if_over_capacity(), Some("a"));
        assert_eq!(lru.evict_if_over_capacity(), None);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_capacity_zero_never_evicts() {
        let mut lru = LruTracker::new(0);

        for key in ["a", "b", "c", "d"] {
            lru.touch(key);
        }
        assert_eq!(lru.evict_if_over_capacity(), None);
        assert_eq!(lru.len(), 4);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new(10);

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.remove(&"key2");

        assert_eq!(lru.len(), 2);
        assert_eq!(lru.coldest(), Some(&"key1"));
    }

    #[test]
    fn test_lru_remove_coldest_updates_tail() {
        let mut lru = LruTracker::new(10);

        lru.touch("a");
        lru.touch("b");
        lru.remove(&"a");

        assert_eq!(lru.coldest(), Some(&"b"));
    }

    #[test]
    fn test_lru_remove_absent_is_noop() {
        let mut lru = LruTracker::new(10);

        lru.touch("key1");
        lru.remove(&"nonexistent");

        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_slot_reuse_after_removal() {
        let mut lru = LruTracker::new(10);

        lru.touch("a");
        lru.touch("b");
        lru.remove(&"a");
        lru.touch("c");
        lru.touch("d");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.coldest(), Some(&"b"));
    }

    #[test]
    fn test_lru_eviction_order_after_touches() {
        let mut lru = LruTracker::new(0);

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        // Recency, coldest first: a, c, b.
        for expected in ["a", "c", "b"] {
            assert_eq!(lru.coldest(), Some(&expected));
            lru.remove(&expected);
        }
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_single_key_touch_cycle() {
        let mut lru = LruTracker::new(1);

        lru.touch("only");
        lru.touch("only");
        lru.touch("only");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.coldest(), Some(&"only"));
        assert_eq!(lru.evict_if_over_capacity(), None);
    }
}
