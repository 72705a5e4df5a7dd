//! # Domain Errors

use shared_types::ResourceScope;
use thiserror::Error;

/// Realtime layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RealtimeError {
    /// Subscriptions need an authenticated actor.
    #[error("No authenticated actor; cannot subscribe")]
    NoActor,

    /// The push transport refused to open a channel.
    #[error("Failed to open channel {scope}: {message}")]
    ChannelOpen {
        scope: ResourceScope,
        message: String,
    },
}
