//! In-memory query cache.
//!
//! Records staleness marks and refetch requests per key. Clearing
//! staleness is the query layer's job, done here by `complete_refetch`.

use crate::domain::QueryKey;
use crate::ports::QueryCache;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Observable state of one cached query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntryState {
    pub stale: bool,
    pub stale_marks: u32,
    pub refetches_requested: u32,
}

/// Mock query cache.
#[derive(Debug, Default)]
pub struct InMemoryQueryCache {
    entries: Mutex<BTreeMap<QueryKey, CacheEntryState>>,
}

impl InMemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache `key` as fresh.
    pub fn insert_fresh(&self, key: QueryKey) {
        self.entries.lock().insert(key, CacheEntryState::default());
    }

    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntryState> {
        self.entries.lock().get(key).copied()
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entry(key).is_some_and(|entry| entry.stale)
    }

    /// Refetch finished: the entry is fresh again.
    pub fn complete_refetch(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.stale = false;
        }
    }

    pub fn evict(&self, key: &QueryKey) {
        self.entries.lock().remove(key);
    }
}

impl QueryCache for InMemoryQueryCache {
    fn keys(&self) -> Vec<QueryKey> {
        self.entries.lock().keys().cloned().collect()
    }

    fn mark_stale(&self, key: &QueryKey) -> bool {
        match self.entries.lock().get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                entry.stale_marks += 1;
                true
            }
            None => false,
        }
    }

    fn schedule_refetch(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.refetches_requested += 1;
        }
    }
}
