//! # Backoff Policy
//!
//! Capped exponential backoff with optional equal jitter.
//!
//! Used for cart sync retries and realtime reconnects. Delay for attempt `n`
//! (1-based) is `base × 2^(n-1)`, capped at `max_delay`. With jitter enabled
//! the delay is drawn uniformly from `[d/2, d]` so that many clients dropped
//! by the same outage do not reconnect in lockstep.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest exponent applied to the base delay.
const MAX_EXPONENT: u32 = 16;

/// Retry/reconnect schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Total attempts, including the first. `1` disables retries.
    pub max_attempts: u32,
    /// Randomize each delay within `[d/2, d]`.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_attempts: 5,
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Deterministic delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Delay before retry `attempt`, jittered when enabled.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        if !self.jitter {
            return delay;
        }
        let millis = delay.as_millis() as u64;
        let half = millis / 2;
        Duration::from_millis(half + rand::thread_rng().gen_range(0..=millis - half))
    }

    /// Whether another attempt is allowed after `attempts_made`.
    #[must_use]
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}
