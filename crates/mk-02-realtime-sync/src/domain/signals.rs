//! # Channel Signals
//!
//! Everything a single push channel can report. Lifecycle signals drive the
//! connection status machine; `Change` carries a row-level notification with
//! no row payload.

use serde::{Deserialize, Serialize};
use shared_types::{ChangeKind, ConnectionStatus, ResourceKind};

/// One signal from an open push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum ChannelSignal {
    /// Server confirmed the subscription.
    Subscribed,
    /// Server closed the channel.
    Closed,
    /// Channel failed (authorization, publication missing, transport).
    ChannelError { message: String },
    /// Subscription was not confirmed in time.
    TimedOut,
    /// A row covered by the subscription changed.
    Change {
        resource: ResourceKind,
        resource_id: String,
        kind: ChangeKind,
    },
}

impl ChannelSignal {
    /// Status a lifecycle signal moves the connection to. `None` for changes.
    #[must_use]
    pub fn target_status(&self) -> Option<ConnectionStatus> {
        match self {
            Self::Subscribed => Some(ConnectionStatus::Connected),
            Self::Closed | Self::ChannelError { .. } => Some(ConnectionStatus::Disconnected),
            Self::TimedOut => Some(ConnectionStatus::Reconnecting),
            Self::Change { .. } => None,
        }
    }

    /// Whether the channel is finished after this signal.
    #[must_use]
    pub fn ends_channel(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::ChannelError { .. } | Self::TimedOut
        )
    }
}
