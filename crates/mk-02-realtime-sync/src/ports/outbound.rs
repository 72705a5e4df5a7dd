//! # Outbound Ports
//!
//! The push transport and the cached read-query layer.

use crate::domain::{ActorId, ChannelSignal, QueryKey, RealtimeError, ResourceScope};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Push transport - outbound port.
///
/// Production: a websocket/Postgres-changes client
/// Testing: `InMemoryPushChannel`
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Open one channel for `(actor, scope)`.
    ///
    /// The channel is torn down when the returned receiver is dropped. The
    /// sender side ending is treated as `Closed`.
    async fn open(
        &self,
        actor: &ActorId,
        scope: &ResourceScope,
    ) -> Result<mpsc::Receiver<ChannelSignal>, RealtimeError>;
}

/// Cached read-query layer - outbound port.
///
/// The router only marks entries stale and asks for refetches. The query
/// layer owns refetching and clearing staleness, and reports completion back
/// through `InvalidationRouter::refetch_completed`.
pub trait QueryCache: Send + Sync {
    /// Keys currently cached.
    fn keys(&self) -> Vec<QueryKey>;

    /// Flag `key` stale. Returns `false` if the key is not cached.
    fn mark_stale(&self, key: &QueryKey) -> bool;

    /// Ask the query layer to refetch `key`.
    fn schedule_refetch(&self, key: &QueryKey);
}
