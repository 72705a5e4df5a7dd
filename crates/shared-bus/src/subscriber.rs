//! # Receiving Side
//!
//! A [`Subscription`] wraps one broadcast receiver plus the filter it was
//! opened with. Non-matching events are skipped inside `recv`, so callers
//! only ever see what they asked for.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::events::{EventFilter, MarketEvent};

/// Anything that can hand out filtered receivers.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every publisher handle is gone; nothing more will arrive.
    #[error("event bus closed")]
    Closed,
}

/// One step of a [`Subscription`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(MarketEvent),
    /// This many events were overwritten before they could be read.
    Lagged(u64),
}

/// Filtered view of the bus held by one consumer.
pub struct Subscription {
    receiver: broadcast::Receiver<MarketEvent>,
    filter: EventFilter,
    skipped: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<MarketEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            skipped: 0,
        }
    }

    /// Wait for the next matching event or a lag report. `None` once the
    /// bus is gone.
    ///
    /// Consumers that must not silently miss events use this instead of
    /// [`recv`](Self::recv). After a `Lagged` report reception continues
    /// with the oldest event still buffered.
    pub async fn next_delivery(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(Delivery::Event(event)),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    self.record_lag(missed);
                    return Some(Delivery::Lagged(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    ///
    /// Lag is only counted in [`skipped`](Self::skipped).
    pub async fn recv(&mut self) -> Option<MarketEvent> {
        loop {
            if let Delivery::Event(event) = self.next_delivery().await? {
                return Some(event);
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<MarketEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => self.record_lag(missed),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Everything matching that is buffered right now, oldest first.
    pub fn drain(&mut self) -> Vec<MarketEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }

    /// Events this receiver lost by falling behind the channel capacity.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn record_lag(&mut self, missed: u64) {
        self.skipped += missed;
        warn!(missed, total = self.skipped, "bus receiver fell behind, oldest events dropped");
    }
}
