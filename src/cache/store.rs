//! Cache Store Module
//!
//! Capacity-bounded storage combining the recency list with eviction
//! bookkeeping. The store is synchronous and lock-free on its own; the
//! [`Cache`](crate::cache::Cache) service owns the lock around it.

use crate::cache::{CacheEntry, RecencyList};
use crate::eviction::Decision;

// == Eviction Record ==
/// Why a particular entry was evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// The strategy's victim was still resident and was removed
    Chosen,
    /// The strategy named a key that was no longer resident; the tail went instead
    StaleVictim,
    /// The strategy declined; the tail went instead
    Declined,
}

impl EvictionReason {
    /// True when the strategy's choice was not applied as-is.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, EvictionReason::Chosen)
    }
}

/// An eviction that took place during a `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    /// The key that left the cache
    pub key: String,
    pub reason: EvictionReason,
}

// == Cache Store ==
/// Main cache storage with a strict resident-count bound.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries in recency order, with their key index
    entries: RecencyList,
    /// Maximum number of resident entries
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one so eviction always has a tail.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RecencyList::new(),
            capacity: capacity.max(1),
        }
    }

    // == Get ==
    /// Returns the value for `key` and promotes it to most recently used.
    ///
    /// Recording the access in key statistics is the caller's job.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        if !self.entries.touch(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Inserts or overwrites `key`, leaving it most recently used.
    ///
    /// Never evicts; returns true when the store is now over capacity and
    /// exactly one eviction is owed.
    pub fn put(&mut self, key: String, value: Vec<u8>) -> bool {
        self.entries.push_front(CacheEntry::new(key, value));
        self.is_over_capacity()
    }

    // == Overwrite ==
    /// Replaces the value of a resident key and promotes it.
    ///
    /// Returns false, leaving the store untouched, when `key` is not resident.
    pub fn overwrite(&mut self, key: &str, value: Vec<u8>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.replace_value(value);
                self.entries.touch(key)
            }
            None => false,
        }
    }

    // == Remove ==
    /// Removes an entry by key. Returns the removed entry, if any.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    // == Candidates ==
    /// Returns up to `window` of the coldest resident keys, coldest first.
    pub fn candidates(&self, window: usize) -> Vec<String> {
        self.entries.coldest(window)
    }

    // == Evict ==
    /// Applies a strategy decision, removing exactly one entry.
    ///
    /// A victim that is no longer resident, or a decline, falls back to the
    /// current tail. Returns None only when the store is empty.
    pub fn evict(&mut self, decision: Decision) -> Option<Eviction> {
        let (entry, reason) = match decision {
            Decision::Evict(victim) => match self.entries.remove(&victim) {
                Some(entry) => (entry, EvictionReason::Chosen),
                None => (self.entries.pop_back()?, EvictionReason::StaleVictim),
            },
            Decision::Decline => (self.entries.pop_back()?, EvictionReason::Declined),
        };
        Some(Eviction {
            key: entry.key,
            reason,
        })
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when more entries are resident than the capacity allows.
    pub fn is_over_capacity(&self) -> bool {
        self.entries.len() > self.capacity
    }

    // == Length ==
    /// Returns the current number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Contains ==
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    // == Keys ==
    /// Resident keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys()
    }
}
