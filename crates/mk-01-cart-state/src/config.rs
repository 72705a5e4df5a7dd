//! # Cart Configuration
//!
//! Configuration for the cart state engine.

use crate::domain::FeeSchedule;
use serde::{Deserialize, Serialize};
use shared_types::BackoffPolicy;
use std::time::Duration;

/// Default storage namespace.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "marketplace";

/// Default persistence throttle window.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;

/// Cart engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Fees applied on every local recompute.
    pub fees: FeeSchedule,

    /// Namespace prefix for the persisted cart key.
    pub storage_namespace: String,

    /// Throttle window for persistence writes. `0` writes through on every
    /// mutation.
    pub flush_interval_ms: u64,

    /// Retry schedule for the remote phase of each mutation.
    pub sync_retry: BackoffPolicy,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            sync_retry: BackoffPolicy {
                base_delay_ms: 500,
                max_delay_ms: 8_000,
                max_attempts: 3,
                jitter: true,
            },
        }
    }
}

impl CartConfig {
    /// Create a config for testing (write-through, fast deterministic retries).
    pub fn for_testing() -> Self {
        Self {
            flush_interval_ms: 0,
            sync_retry: BackoffPolicy {
                base_delay_ms: 10,
                max_delay_ms: 100,
                max_attempts: 3,
                jitter: false,
            },
            ..Self::default()
        }
    }

    /// Key under which the cart blob is persisted.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}:cart", self.storage_namespace)
    }

    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
