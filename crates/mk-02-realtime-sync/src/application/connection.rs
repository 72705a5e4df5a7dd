//! # Connection Manager
//!
//! Owns one push subscription per `(actor, scope)` and the shared connection
//! status.
//!
//! ```text
//! set_actor(A, [s1, s2]) ──→ handles{s1, s2} ──spawn──→ pump(s1), pump(s2)
//!                                                         │
//!                 Subscribed ─→ Connected                 │ signals
//!                 Change     ─→ bus: ResourceChanged  ←───┘
//!                 Closed/Error ─→ Disconnected ─→ Reconnecting ─→ reopen
//!                 TimedOut   ─→ Reconnecting ─→ reopen
//! ```
//!
//! Dropping a [`SubscriptionHandle`] aborts its pump task, which drops the
//! channel receiver and tears the transport channel down.

use crate::application::status::StatusTracker;
use crate::config::RealtimeConfig;
use crate::domain::{
    ActorId, ChangeNotification, ChannelSignal, ConnectionStatus, RealtimeError, ResourceScope,
};
use crate::ports::{PushChannel, RealtimeApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, MarketEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Live registration for one `(actor, scope)` pair.
pub struct SubscriptionHandle {
    id: Uuid,
    actor: ActorId,
    scope: ResourceScope,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(id = %self.id, scope = %self.scope, "Subscription handle released");
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("actor", &self.actor)
            .field("scope", &self.scope)
            .finish()
    }
}

/// State shared with pump tasks.
struct Shared {
    config: RealtimeConfig,
    channel: Arc<dyn PushChannel>,
    events: Arc<dyn EventPublisher>,
    status: StatusTracker,
}

/// Connection/subscription manager.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    actor: Mutex<Option<ActorId>>,
    handles: Mutex<HashMap<ResourceScope, SubscriptionHandle>>,
}

impl ConnectionManager {
    pub fn new(
        config: RealtimeConfig,
        channel: Arc<dyn PushChannel>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                channel,
                status: StatusTracker::new(events.clone()),
                events,
            }),
            actor: Mutex::new(None),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Active actor, if any.
    pub fn actor(&self) -> Option<ActorId> {
        self.actor.lock().clone()
    }

    /// Watch receiver for status changes.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.watch()
    }

    /// Stream of status values, starting with the current one.
    pub fn status_stream(&self) -> WatchStream<ConnectionStatus> {
        self.shared.status.stream()
    }

    /// Scopes with a live handle.
    pub fn subscribed_scopes(&self) -> Vec<ResourceScope> {
        self.handles.lock().keys().cloned().collect()
    }

    /// Handle id for `scope`, if subscribed.
    pub fn handle_id(&self, scope: &ResourceScope) -> Option<Uuid> {
        self.handles.lock().get(scope).map(SubscriptionHandle::id)
    }

    /// Drop the given handles, announce the closures and settle the status.
    async fn release(&self, released: Vec<SubscriptionHandle>) {
        for handle in released {
            let (actor, scope) = (handle.actor.clone(), handle.scope.clone());
            drop(handle);
            info!(actor = %actor, scope = %scope, "Unsubscribed");
            self.shared
                .events
                .publish(MarketEvent::SubscriptionClosed { actor, scope })
                .await;
        }
        if self.handles.lock().is_empty() {
            self.shared.status.advance(ConnectionStatus::Disconnected).await;
        }
    }
}

#[async_trait]
impl RealtimeApi for ConnectionManager {
    async fn set_actor(
        &self,
        actor: ActorId,
        scopes: Vec<ResourceScope>,
    ) -> Result<usize, RealtimeError> {
        let released: Vec<SubscriptionHandle> = {
            let mut current = self.actor.lock();
            let mut handles = self.handles.lock();
            let switched = current.as_ref() != Some(&actor);
            *current = Some(actor.clone());
            if switched {
                handles.drain().map(|(_, handle)| handle).collect()
            } else {
                let stale: Vec<ResourceScope> = handles
                    .keys()
                    .filter(|scope| !scopes.contains(scope))
                    .cloned()
                    .collect();
                stale
                    .iter()
                    .filter_map(|scope| handles.remove(scope))
                    .collect()
            }
        };
        if !released.is_empty() {
            self.release(released).await;
        }

        let mut opened = 0;
        for scope in scopes {
            if self.subscribe(scope).await? {
                opened += 1;
            }
        }
        Ok(opened)
    }

    async fn logout(&self) {
        let released: Vec<SubscriptionHandle> = {
            let mut current = self.actor.lock();
            let mut handles = self.handles.lock();
            if let Some(actor) = current.take() {
                info!(actor = %actor, "Actor logged out; tearing down subscriptions");
            }
            handles.drain().map(|(_, handle)| handle).collect()
        };
        self.release(released).await;
    }

    async fn subscribe(&self, scope: ResourceScope) -> Result<bool, RealtimeError> {
        let actor = self.actor.lock().clone().ok_or(RealtimeError::NoActor)?;

        let steps = {
            let mut handles = self.handles.lock();
            if handles.contains_key(&scope) {
                debug!(scope = %scope, "Already subscribed");
                return Ok(false);
            }
            let steps = self
                .shared
                .status
                .transition_if(|s| s == ConnectionStatus::Disconnected, ConnectionStatus::Connecting);

            let task = tokio::spawn(pump(
                Arc::clone(&self.shared),
                actor.clone(),
                scope.clone(),
            ));
            let handle = SubscriptionHandle {
                id: Uuid::new_v4(),
                actor: actor.clone(),
                scope: scope.clone(),
                task,
            };
            info!(actor = %actor, scope = %scope, id = %handle.id, "Subscribed");
            handles.insert(scope.clone(), handle);
            steps
        };

        self.shared.status.publish(steps).await;
        self.shared
            .events
            .publish(MarketEvent::SubscriptionOpened { actor, scope })
            .await;
        Ok(true)
    }

    async fn unsubscribe(&self, scope: &ResourceScope) -> bool {
        let removed = self.handles.lock().remove(scope);
        match removed {
            Some(handle) => {
                self.release(vec![handle]).await;
                true
            }
            None => false,
        }
    }

    fn status(&self) -> ConnectionStatus {
        self.shared.status.current()
    }

    fn active_subscriptions(&self) -> usize {
        self.handles.lock().len()
    }

    fn is_subscribed(&self, scope: &ResourceScope) -> bool {
        self.handles.lock().contains_key(scope)
    }
}

/// Keep one scope's channel open, reconnecting with capped backoff.
async fn pump(shared: Arc<Shared>, actor: ActorId, scope: ResourceScope) {
    let policy = shared.config.reconnect;
    let mut reconnects = 0u32;

    loop {
        match shared.channel.open(&actor, &scope).await {
            Ok(signals) => drive(&shared, &actor, &scope, signals, &mut reconnects).await,
            Err(err) => {
                warn!(scope = %scope, error = %err, "Push channel open failed");
                shared.status.advance(ConnectionStatus::Disconnected).await;
            }
        }

        if !policy.allows_another(reconnects) {
            error!(scope = %scope, attempts = reconnects, "Max reconnection attempts reached");
            shared.status.advance(ConnectionStatus::Disconnected).await;
            return;
        }

        reconnects += 1;
        shared.status.advance(ConnectionStatus::Reconnecting).await;
        let delay = policy.next_delay(reconnects);
        info!(
            scope = %scope,
            attempt = reconnects,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting push channel"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Handle signals until the channel ends.
async fn drive(
    shared: &Shared,
    actor: &ActorId,
    scope: &ResourceScope,
    mut signals: mpsc::Receiver<ChannelSignal>,
    reconnects: &mut u32,
) {
    while let Some(signal) = signals.recv().await {
        let Some(next) = signal.target_status() else {
            if let ChannelSignal::Change {
                resource,
                resource_id,
                kind,
            } = signal
            {
                debug!(scope = %scope, resource = %resource, id = %resource_id, ?kind, "Push change");
                shared
                    .events
                    .publish(MarketEvent::ResourceChanged(ChangeNotification {
                        actor: actor.clone(),
                        scope: scope.clone(),
                        resource,
                        resource_id,
                        kind,
                    }))
                    .await;
            }
            continue;
        };

        match &signal {
            ChannelSignal::Subscribed => {
                *reconnects = 0;
                debug!(scope = %scope, "Push channel confirmed");
            }
            ChannelSignal::ChannelError { message } => {
                warn!(scope = %scope, error = %message, "Push channel error");
            }
            other => warn!(scope = %scope, signal = ?other, "Push channel lost"),
        }
        shared.status.advance(next).await;
        if signal.ends_channel() {
            return;
        }
    }

    debug!(scope = %scope, "Push channel ended");
    shared.status.advance(ConnectionStatus::Disconnected).await;
}
