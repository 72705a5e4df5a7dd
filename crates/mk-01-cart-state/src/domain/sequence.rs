//! # Sync Sequencing
//!
//! Every local mutation takes the next sequence number. A remote response is
//! applied only if it was issued at or after the last applied one, so a slow
//! response for an old mutation never overwrites a newer reconciliation.

use serde::{Deserialize, Serialize};

/// Sequence counter for one cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSequence {
    issued: u64,
    last_applied: u64,
}

impl SyncSequence {
    /// Issue the next sequence number.
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a response for `seq` may still be applied.
    #[must_use]
    pub fn should_apply(&self, seq: u64) -> bool {
        seq >= self.last_applied
    }

    /// Record that the response for `seq` was applied.
    pub fn mark_applied(&mut self, seq: u64) {
        self.last_applied = self.last_applied.max(seq);
    }

    /// Whether the newest local mutation is still unacknowledged.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.issued > self.last_applied
    }

    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }
}
