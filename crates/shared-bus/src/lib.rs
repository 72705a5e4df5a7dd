//! # Shared Bus - Event Bus for the Client State Engine
//!
//! Components never call each other's callbacks directly. The connection
//! manager, the cart pipeline and the invalidation router publish typed
//! [`MarketEvent`]s; anything interested subscribes with an [`EventFilter`].
//!
//! ```text
//! ┌────────────────────┐                    ┌──────────────────────┐
//! │ ConnectionManager  │    publish()       │ InvalidationRouter   │
//! │ CartStore          │ ──────┐            │ UI observers         │
//! └────────────────────┘       │            └──────────────────────┘
//!                              ▼                    ↑
//!                        ┌──────────────┐          │
//!                        │  Event Bus   │ ─────────┘
//!                        └──────────────┘  subscribe()
//! ```
//!
//! Delivery is at-most-once per subscriber. A subscriber that falls more than
//! the channel capacity behind skips the oldest events; invalidation is
//! idempotent, so a skipped duplicate is harmless.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventSource, EventTopic, MarketEvent};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus};
pub use subscriber::{Delivery, EventSubscriber, Subscription, SubscriptionError};

/// Per-receiver backlog before the oldest events are overwritten.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

