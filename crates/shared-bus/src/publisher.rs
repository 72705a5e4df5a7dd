//! # Publishing Side
//!
//! One `tokio::sync::broadcast` channel carries every [`MarketEvent`].
//! Subscribers each hold their own receiver and apply their filter locally,
//! so publishing never blocks on a slow consumer.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use crate::events::{EventFilter, MarketEvent};
use crate::subscriber::{EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Anything that can put an event on the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Broadcast `event` and return how many receivers were live.
    ///
    /// Zero is not an error: the cart and the connection manager publish
    /// whether or not anyone is listening.
    async fn publish(&self, event: MarketEvent) -> usize;
}

/// Counters describing what went through the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub published: u64,
    /// Events published while no receiver was attached.
    pub unheard: u64,
}

/// Process-local bus shared by every component of a client session.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<MarketEvent>,
    published: AtomicU64,
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the per-receiver backlog before the oldest events are
    /// overwritten. Clamped to at least 1.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    /// Attach a receiver that only yields events accepted by `filter`.
    ///
    /// Events published before this call are never seen.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        trace!(topics = ?filter.topics, sources = ?filter.sources, "bus receiver attached");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Receivers currently attached, filtered or not.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            unheard: self.unheard.load(Ordering::Relaxed),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: MarketEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, receivers, "event published");
                receivers
            }
            Err(_) => {
                self.unheard.fetch_add(1, Ordering::Relaxed);
                trace!(?topic, "event published with no receivers");
                0
            }
        }
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}
