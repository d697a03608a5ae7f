//! Unique vertex index bookkeeping.

use std::collections::HashSet;

use crate::core::error::{Error, Result};

/// Storage of the currently-used vertex indices with cached min/max.
///
/// `add` maintains the cache in O(1); removing a boundary index rescans
/// the set to re-establish it.
#[derive(Debug, Clone, Default)]
pub struct IndexStorage {
    indices: HashSet<u64>,
    min: Option<u64>,
    max: Option<u64>,
}

impl IndexStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an index. Returns false if it was already present.
    pub fn add(&mut self, index: u64) -> bool {
        if !self.indices.insert(index) {
            return false;
        }
        self.min = Some(self.min.map_or(index, |current| current.min(index)));
        self.max = Some(self.max.map_or(index, |current| current.max(index)));
        true
    }

    /// Remove an index; fails with `NotFound` if it is not registered.
    pub fn remove(&mut self, index: u64) -> Result<()> {
        if !self.indices.remove(&index) {
            return Err(Error::not_found(format!("index {} in storage", index)));
        }
        if self.indices.is_empty() {
            self.min = None;
            self.max = None;
            return Ok(());
        }
        if self.min == Some(index) {
            self.min = self.indices.iter().copied().min();
        }
        if self.max == Some(index) {
            self.max = self.indices.iter().copied().max();
        }
        Ok(())
    }

    pub fn contains(&self, index: u64) -> bool {
        self.indices.contains(&index)
    }

    pub fn min_index(&self) -> Option<u64> {
        self.min
    }

    pub fn max_index(&self) -> Option<u64> {
        self.max
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Next free index: one past the current maximum, 0 for an empty
    /// storage.
    pub fn generate_index(&self) -> u64 {
        self.max.map_or(0, |max| max + 1)
    }

    /// Shift all indices so the minimum becomes 0, preserving relative
    /// order and cardinality.
    pub fn normalize(&mut self) {
        let Some(min) = self.min else {
            return;
        };
        if min == 0 {
            return;
        }
        self.indices = self.indices.iter().map(|index| index - min).collect();
        self.max = self.max.map(|max| max - min);
        self.min = Some(0);
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.indices.iter().copied()
    }
}
