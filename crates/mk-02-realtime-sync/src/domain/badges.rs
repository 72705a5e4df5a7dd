//! # Badge Counters
//!
//! Unread/new-item counts shown on navigation badges. A counter only ever
//! takes the value of an authoritative refetch; push events invalidate the
//! backing query and never bump the number locally.

use parking_lot::RwLock;
use shared_types::QueryKey;
use std::collections::HashMap;

/// Badge counts keyed by the query that produces them.
#[derive(Debug, Default)]
pub struct BadgeCounters {
    counts: RwLock<HashMap<QueryKey, u64>>,
}

impl BadgeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count returned by a completed refetch of `key`.
    /// Returns whether the displayed value changed.
    pub fn record_refetched(&self, key: &QueryKey, count: u64) -> bool {
        let previous = self.counts.write().insert(key.clone(), count);
        previous != Some(count)
    }

    /// Last authoritative count for `key`; zero if never fetched.
    pub fn get(&self, key: &QueryKey) -> u64 {
        self.counts.read().get(key).copied().unwrap_or(0)
    }

    /// Forget every count (logout).
    pub fn reset(&self) {
        self.counts.write().clear();
    }
}
