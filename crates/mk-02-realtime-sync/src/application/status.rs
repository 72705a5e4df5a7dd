//! # Connection Status Tracker
//!
//! Holds the current `ConnectionStatus` in a watch channel and publishes
//! every transition on the bus. A requested status that is not a direct edge
//! is reached through `Disconnected` when that path exists; otherwise the
//! request is ignored.

use shared_bus::{EventPublisher, MarketEvent};
use shared_types::ConnectionStatus;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

type Step = (ConnectionStatus, ConnectionStatus);

pub(crate) struct StatusTracker {
    tx: watch::Sender<ConnectionStatus>,
    events: Arc<dyn EventPublisher>,
}

impl StatusTracker {
    pub(crate) fn new(events: Arc<dyn EventPublisher>) -> Self {
        let (tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self { tx, events }
    }

    pub(crate) fn current(&self) -> ConnectionStatus {
        *self.tx.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }

    pub(crate) fn stream(&self) -> WatchStream<ConnectionStatus> {
        WatchStream::new(self.tx.subscribe())
    }

    /// Move to `next` now; returns the steps taken.
    pub(crate) fn transition(&self, next: ConnectionStatus) -> Vec<Step> {
        self.transition_if(|_| true, next)
    }

    /// Move to `next` only if the current status satisfies `guard`.
    pub(crate) fn transition_if(
        &self,
        guard: impl FnOnce(ConnectionStatus) -> bool,
        next: ConnectionStatus,
    ) -> Vec<Step> {
        let mut steps = Vec::new();
        self.tx.send_if_modified(|current| {
            if !guard(*current) {
                return false;
            }
            steps = plan(*current, next);
            match steps.last() {
                Some(&(_, to)) => {
                    *current = to;
                    true
                }
                None => false,
            }
        });
        steps
    }

    /// Publish steps returned by `transition`.
    pub(crate) async fn publish(&self, steps: Vec<Step>) {
        for (from, to) in steps {
            if to == ConnectionStatus::Connected || from == ConnectionStatus::Connected {
                info!(from = %from, to = %to, "Connection status changed");
            } else {
                debug!(from = %from, to = %to, "Connection status changed");
            }
            self.events
                .publish(MarketEvent::ConnectionStatusChanged { from, to })
                .await;
        }
    }

    pub(crate) async fn advance(&self, next: ConnectionStatus) {
        let steps = self.transition(next);
        self.publish(steps).await;
    }
}

fn plan(current: ConnectionStatus, next: ConnectionStatus) -> Vec<Step> {
    use ConnectionStatus::Disconnected;

    if current == next {
        return Vec::new();
    }
    if current.can_transition_to(next) {
        return vec![(current, next)];
    }
    if current.can_transition_to(Disconnected) && Disconnected.can_transition_to(next) {
        return vec![(current, Disconnected), (Disconnected, next)];
    }
    debug!(from = %current, to = %next, "Ignoring invalid status transition");
    Vec::new()
}
