//! Recency List Module
//!
//! Doubly-linked recency order over resident entries plus the key index that
//! gives O(1) lookup and promotion.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Node ==
#[derive(Debug)]
struct Node {
    entry: CacheEntry,
    /// Neighbour towards the head (more recently used)
    prev: Option<usize>,
    /// Neighbour towards the tail (less recently used)
    next: Option<usize>,
}

// == Recency List ==
/// Tracks resident entries in access order.
///
/// Nodes live in a slab and link to each other by slot index:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// The key index always holds exactly the keys that are linked into the list.
#[derive(Debug, Default)]
pub struct RecencyList {
    slots: Vec<Option<Node>>,
    /// Vacated slots ready for reuse
    free: Vec<usize>,
    /// Key -> slot
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl RecencyList {
    // == Constructor ==
    /// Creates a new empty recency list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Returns the entry for `key` without changing its position.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|node| &node.entry)
    }

    /// Returns a mutable entry for `key` without changing its position.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_mut().map(|node| &mut node.entry)
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// Returns false if the key is not resident.
    pub fn touch(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
        true
    }

    // == Push Front ==
    /// Inserts an entry as most recently used.
    ///
    /// An entry already resident under the same key is replaced in place and
    /// promoted, so a key is never linked twice.
    pub fn push_front(&mut self, entry: CacheEntry) {
        if let Some(existing) = self.get_mut(&entry.key) {
            existing.replace_value(entry.value);
            self.touch(&entry.key);
            return;
        }

        let key = entry.key.clone();
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.attach_front(idx);
    }

    // == Remove ==
    /// Unlinks and returns the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let idx = self.index.remove(key)?;
        self.release(idx)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<CacheEntry> {
        let idx = self.tail?;
        let entry = self.release(idx)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    // == Coldest ==
    /// Returns up to `limit` keys from the tail, coldest first.
    pub fn coldest(&self, limit: usize) -> Vec<String> {
        let mut keys = Vec::with_capacity(limit.min(self.len()));
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            if keys.len() == limit {
                break;
            }
            let Some(node) = self.slots[idx].as_ref() else {
                break;
            };
            keys.push(node.entry.key.clone());
            cursor = node.prev;
        }
        keys
    }

    // == Keys ==
    /// Returns every resident key, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.slots[idx].as_ref() else {
                break;
            };
            keys.push(node.entry.key.clone());
            cursor = node.next;
        }
        keys
    }

    // == Length ==
    /// Returns the number of resident keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Contains ==
    /// Checks if a key is resident.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Internal Linking ==
    fn detach(&mut self, idx: usize) {
        let Some((prev, next)) = self.slots[idx].as_ref().map(|n| (n.prev, n.next)) else {
            return;
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

        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.slots[h].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Unlinks slot `idx` and frees it. The caller owns the index update.
    fn release(&mut self, idx: usize) -> Option<CacheEntry> {
        self.detach(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        Some(node.entry)
    }
}
