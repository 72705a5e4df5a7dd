//! # Market Events
//!
//! Every event that flows through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, ChangeNotification, ConnectionStatus, QueryKey, ResourceScope};

/// Everything that travels over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    // =========================================================================
    // REALTIME: CONNECTION MANAGER
    // =========================================================================
    /// The push connection moved to a new state.
    ConnectionStatusChanged {
        from: ConnectionStatus,
        to: ConnectionStatus,
    },

    /// A subscription handle was opened for `(actor, scope)`.
    SubscriptionOpened { actor: ActorId, scope: ResourceScope },

    /// A subscription handle was torn down.
    SubscriptionClosed { actor: ActorId, scope: ResourceScope },

    /// The backend reported a change to a resource. No row payload.
    ResourceChanged(ChangeNotification),

    // =========================================================================
    // CACHE: INVALIDATION ROUTER
    // =========================================================================
    /// A cached query was marked stale.
    ///
    /// `refetch_scheduled` is `true` only for the first mark since the last
    /// completed refetch; duplicates arrive with `false`.
    QueryInvalidated {
        key: QueryKey,
        refetch_scheduled: bool,
    },

    // =========================================================================
    // CART: MUTATION PIPELINE
    // =========================================================================
    /// A remote sync response was applied to the cart.
    CartSynced { seq: u64 },

    /// A remote sync response arrived out of order and was dropped.
    CartSyncDiscarded { seq: u64, last_applied: u64 },

    /// Remote sync gave up after exhausting its retry budget.
    CartSyncFailed {
        seq: u64,
        attempts: u32,
        error: String,
    },
}

impl MarketEvent {
    /// Coarse category used by [`EventFilter`].
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ConnectionStatusChanged { .. }
            | Self::SubscriptionOpened { .. }
            | Self::SubscriptionClosed { .. } => EventTopic::Connection,
            Self::ResourceChanged(_) => EventTopic::Changes,
            Self::QueryInvalidated { .. } => EventTopic::Cache,
            Self::CartSynced { .. }
            | Self::CartSyncDiscarded { .. }
            | Self::CartSyncFailed { .. } => EventTopic::Cart,
        }
    }

    /// Component that publishes this variant.
    #[must_use]
    pub fn source(&self) -> EventSource {
        match self {
            Self::ConnectionStatusChanged { .. }
            | Self::SubscriptionOpened { .. }
            | Self::SubscriptionClosed { .. }
            | Self::ResourceChanged(_) => EventSource::Realtime,
            Self::QueryInvalidated { .. } => EventSource::Router,
            Self::CartSynced { .. }
            | Self::CartSyncDiscarded { .. }
            | Self::CartSyncFailed { .. } => EventSource::Cart,
        }
    }
}

/// Coarse event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Connection status and subscription lifecycle.
    Connection,
    /// Backend change notifications.
    Changes,
    /// Query cache staleness.
    Cache,
    /// Cart remote sync outcomes.
    Cart,
    /// Matches every topic.
    All,
}

/// Emitting component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    Realtime,
    Router,
    Cart,
}

/// Which events a [`Subscription`](crate::Subscription) yields.
///
/// An empty list on either axis accepts everything on that axis; both axes
/// must accept an event for it to be delivered.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub topics: Vec<EventTopic>,
    pub sources: Vec<EventSource>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_sources(sources: Vec<EventSource>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, event: &MarketEvent) -> bool {
        let wants_topic = match self.topics.as_slice() {
            [] => true,
            topics => topics
                .iter()
                .any(|t| *t == EventTopic::All || *t == event.topic()),
        };
        wants_topic && (self.sources.is_empty() || self.sources.contains(&event.source()))
    }
}
