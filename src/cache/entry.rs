//! Cache Entry Module
//!
//! Defines the structure for individual resident cache entries.

// == Cache Entry ==
/// A resident key together with its stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: Vec<u8>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    // == Replace Value ==
    /// Overwrites the stored value in place, returning the previous one.
    pub fn replace_value(&mut self, value: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.value, value)
    }
}
