//! Bounded history of the most recent events

use std::collections::VecDeque;

/// Fixed-capacity FIFO ring
///
/// Stored oldest-first; pushing into a full ring evicts the oldest entry.
/// Reads come back newest-first.
#[derive(Debug, Clone)]
pub struct RecentHistoryRing<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RecentHistoryRing<T> {
    /// `capacity` is clamped to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning the evicted oldest entry when full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Up to `limit` entries, newest first
    pub fn snapshot_slice(&self, limit: usize) -> Vec<T> {
        self.items.iter().rev().take(limit).cloned().collect()
    }

    /// All entries, newest first
    pub fn snapshot(&self) -> Vec<T> {
        self.snapshot_slice(self.items.len())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
