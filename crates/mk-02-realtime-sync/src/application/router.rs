//! # Cache Invalidation Router
//!
//! Turns `ResourceChanged` bus events into staleness marks on the cached
//! read queries they affect. Payloads are never applied to the cache; the
//! query layer refetches.
//!
//! Every matching event marks its keys stale again, but a key with a refetch
//! already outstanding does not get a second one until the query layer
//! reports completion via [`InvalidationRouter::refetch_completed`].
//!
//! If the router falls behind the bus and changes are overwritten unread,
//! every cached key without a refetch outstanding is invalidated.

use crate::domain::{ChangeNotification, InvalidationRules, QueryKey};
use crate::ports::QueryCache;
use parking_lot::Mutex;
use shared_bus::{Delivery, EventFilter, EventPublisher, EventSubscriber, EventTopic, MarketEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

struct RouterInner {
    rules: InvalidationRules,
    cache: Arc<dyn QueryCache>,
    events: Arc<dyn EventPublisher>,
    pending: Mutex<HashSet<QueryKey>>,
    stale_marks: AtomicU64,
    lag_recoveries: AtomicU64,
}

/// Invalidation router. Cheap to clone.
#[derive(Clone)]
pub struct InvalidationRouter {
    inner: Arc<RouterInner>,
}

impl InvalidationRouter {
    pub fn new(
        rules: InvalidationRules,
        cache: Arc<dyn QueryCache>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                rules,
                cache,
                events,
                pending: Mutex::new(HashSet::new()),
                stale_marks: AtomicU64::new(0),
                lag_recoveries: AtomicU64::new(0),
            }),
        }
    }

    /// Route bus changes until the bus closes.
    pub fn spawn(&self, bus: &dyn EventSubscriber) -> JoinHandle<()> {
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Changes]));
        let router = self.clone();
        tokio::spawn(async move {
            while let Some(delivery) = subscription.next_delivery().await {
                match delivery {
                    Delivery::Event(MarketEvent::ResourceChanged(change)) => {
                        router.handle_change(&change).await;
                    }
                    Delivery::Event(_) => {}
                    Delivery::Lagged(missed) => {
                        router.recover_from_lag(missed).await;
                    }
                }
            }
            debug!("Invalidation router stopped");
        })
    }

    /// Mark every cached key covered by `change` stale.
    ///
    /// Returns the keys marked.
    pub async fn handle_change(&self, change: &ChangeNotification) -> Vec<QueryKey> {
        let cached = self.inner.cache.keys();
        let affected = self.inner.rules.affected_keys(change, &cached);
        if affected.is_empty() {
            trace!(resource = %change.resource, id = %change.resource_id, "Change affects no cached query");
            return affected;
        }
        self.invalidate(affected).await
    }

    /// `missed` bus events were lost before they could be routed.
    ///
    /// Any of them may have covered any cached query, so every cached key
    /// without a refetch outstanding is marked stale and refetched. Keys
    /// already pending are left alone.
    pub async fn recover_from_lag(&self, missed: u64) -> Vec<QueryKey> {
        self.inner.lag_recoveries.fetch_add(1, Ordering::Relaxed);
        let cached = self.inner.cache.keys();
        let idle: Vec<QueryKey> = {
            let pending = self.inner.pending.lock();
            cached
                .into_iter()
                .filter(|key| !pending.contains(key))
                .collect()
        };
        warn!(missed, keys = idle.len(), "Router missed bus events; invalidating cached queries");
        self.invalidate(idle).await
    }

    async fn invalidate(&self, keys: Vec<QueryKey>) -> Vec<QueryKey> {
        let mut invalidated = Vec::with_capacity(keys.len());
        for key in keys {
            if !self.inner.cache.mark_stale(&key) {
                continue;
            }
            self.inner.stale_marks.fetch_add(1, Ordering::Relaxed);

            let refetch_scheduled = self.inner.pending.lock().insert(key.clone());
            if refetch_scheduled {
                self.inner.cache.schedule_refetch(&key);
            }
            debug!(key = %key, refetch_scheduled, "Query invalidated");

            self.inner
                .events
                .publish(MarketEvent::QueryInvalidated {
                    key: key.clone(),
                    refetch_scheduled,
                })
                .await;
            invalidated.push(key);
        }
        invalidated
    }

    /// The query layer finished refetching `key`.
    pub fn refetch_completed(&self, key: &QueryKey) -> bool {
        self.inner.pending.lock().remove(key)
    }

    pub fn is_refetch_pending(&self, key: &QueryKey) -> bool {
        self.inner.pending.lock().contains(key)
    }

    pub fn pending_refetches(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Total staleness marks applied.
    pub fn stale_marks(&self) -> u64 {
        self.inner.stale_marks.load(Ordering::Relaxed)
    }

    /// Times the router fell behind the bus and invalidated wholesale.
    pub fn lag_recoveries(&self) -> u64 {
        self.inner.lag_recoveries.load(Ordering::Relaxed)
    }

    /// Forget outstanding refetches (logout).
    pub fn reset(&self) {
        self.inner.pending.lock().clear();
    }
}
