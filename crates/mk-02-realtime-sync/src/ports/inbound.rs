//! # Inbound Ports
//!
//! API trait for managing push subscriptions.

use crate::domain::{ActorId, ConnectionStatus, RealtimeError, ResourceScope};
use async_trait::async_trait;

/// Realtime subscription API - inbound port.
#[async_trait]
pub trait RealtimeApi: Send + Sync {
    /// Make `actor` the active identity and hold exactly `scopes` open.
    ///
    /// A different actor tears every existing subscription down first.
    /// Returns the number of newly opened subscriptions.
    async fn set_actor(
        &self,
        actor: ActorId,
        scopes: Vec<ResourceScope>,
    ) -> Result<usize, RealtimeError>;

    /// Tear every subscription down and forget the actor.
    async fn logout(&self);

    /// Open `scope` for the active actor. Returns `false` if already open.
    async fn subscribe(&self, scope: ResourceScope) -> Result<bool, RealtimeError>;

    /// Close `scope`. Returns `false` if it was not open.
    async fn unsubscribe(&self, scope: &ResourceScope) -> bool;

    /// Current connection status.
    fn status(&self) -> ConnectionStatus;

    /// Number of live subscription handles.
    fn active_subscriptions(&self) -> usize;

    /// Whether `scope` has a live handle.
    fn is_subscribed(&self, scope: &ResourceScope) -> bool;
}
