//! # Realtime Configuration

use serde::{Deserialize, Serialize};
use shared_types::BackoffPolicy;

/// Default per-channel signal buffer.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Default reconnect attempts after an unexpected disconnect.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Realtime layer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Reconnect schedule. `max_attempts` bounds consecutive reconnects;
    /// a confirmed subscription resets the count.
    pub reconnect: BackoffPolicy,

    /// Signals buffered per open channel.
    pub channel_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            reconnect: BackoffPolicy {
                base_delay_ms: 1_000,
                max_delay_ms: 30_000,
                max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
                jitter: true,
            },
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl RealtimeConfig {
    /// Create a config for testing (deterministic, fast reconnects).
    pub fn for_testing() -> Self {
        Self {
            reconnect: BackoffPolicy {
                base_delay_ms: 100,
                max_delay_ms: 1_000,
                max_attempts: 3,
                jitter: false,
            },
            channel_buffer: 16,
        }
    }
}
