//! # Realtime Flows
//!
//! Push channel → connection manager → event bus → invalidation router →
//! query cache, wired the way a session wires them.
//!
//! ## Flow Tested
//!
//! 1. A change on an open channel marks the affected cached queries stale
//! 2. Duplicates before the refetch completes schedule nothing new
//! 3. Reconnects keep routing once the channel is back

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use mk_02_realtime_sync::{
        ChannelSignal, ConnectionManager, InMemoryPushChannel, InMemoryQueryCache,
        InvalidationRouter, InvalidationRules, RealtimeApi, RealtimeConfig,
    };
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, MarketEvent};
    use shared_types::{ActorId, ChangeKind, ConnectionStatus, QueryKey, ResourceKind, ResourceScope};
    use tokio::task::JoinHandle;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        bus: Arc<InMemoryEventBus>,
        push: Arc<InMemoryPushChannel>,
        cache: Arc<InMemoryQueryCache>,
        manager: ConnectionManager,
        router: InvalidationRouter,
        router_task: JoinHandle<()>,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            self.router_task.abort();
        }
    }

    fn harness() -> Harness {
        let bus = Arc::new(InMemoryEventBus::new());
        let push = Arc::new(InMemoryPushChannel::new(16));
        let cache = Arc::new(InMemoryQueryCache::new());
        let manager = ConnectionManager::new(RealtimeConfig::for_testing(), push.clone(), bus.clone());
        let router = InvalidationRouter::new(InvalidationRules::default(), cache.clone(), bus.clone());
        let router_task = router.spawn(bus.as_ref());
        Harness {
            bus,
            push,
            cache,
            manager,
            router,
            router_task,
        }
    }

    fn vendor_orders() -> ResourceScope {
        ResourceScope::vendor(ResourceKind::Orders, "V1")
    }

    fn order_changed(id: &str) -> ChannelSignal {
        ChannelSignal::Change {
            resource: ResourceKind::Orders,
            resource_id: id.into(),
            kind: ChangeKind::Update,
        }
    }

    async fn pause() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // =============================================================================
    // SCENARIO 6: PUSH CHANGE → SINGLE REFETCH
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_order_change_invalidates_vendor_order_list_once() {
        let h = harness();
        let orders_key = QueryKey::scoped("orders", "V1");
        let other_vendor = QueryKey::scoped("orders", "V2");
        h.cache.insert_fresh(orders_key.clone());
        h.cache.insert_fresh(other_vendor.clone());

        h.manager
            .set_actor(ActorId::from("vendor-1"), vec![vendor_orders()])
            .await
            .unwrap();
        pause().await;
        assert_eq!(h.manager.status(), ConnectionStatus::Connected);

        assert!(h.push.emit(&vendor_orders(), order_changed("X")).await);
        pause().await;

        let entry = h.cache.entry(&orders_key).unwrap();
        assert!(entry.stale);
        assert_eq!(entry.stale_marks, 1);
        assert_eq!(entry.refetches_requested, 1);
        assert!(!h.cache.is_stale(&other_vendor));

        // Duplicate before the refetch completes.
        h.push.emit(&vendor_orders(), order_changed("X")).await;
        pause().await;
        assert_eq!(h.cache.entry(&orders_key).unwrap().refetches_requested, 1);
        assert_eq!(h.router.pending_refetches(), 1);

        // Completed refetch re-arms the key.
        h.cache.complete_refetch(&orders_key);
        assert!(h.router.refetch_completed(&orders_key));
        h.push.emit(&vendor_orders(), order_changed("X")).await;
        pause().await;
        assert_eq!(h.cache.entry(&orders_key).unwrap().refetches_requested, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_fans_out_to_every_affected_query() {
        let h = harness();
        let keys = [
            QueryKey::scoped("orders", "V1"),
            QueryKey::scoped("recent_orders", "V1"),
            QueryKey::scoped("vendor_stats", "V1"),
            QueryKey::scoped("order", "X"),
        ];
        for key in &keys {
            h.cache.insert_fresh(key.clone());
        }
        let mut invalidations = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Cache]));

        h.manager
            .set_actor(ActorId::from("vendor-1"), vec![vendor_orders()])
            .await
            .unwrap();
        pause().await;
        h.push.emit(&vendor_orders(), order_changed("X")).await;
        pause().await;

        for key in &keys {
            assert!(h.cache.is_stale(key), "{key} should be stale");
        }
        let events = invalidations.drain();
        assert_eq!(events.len(), keys.len());
        assert!(events.iter().all(|event| matches!(
            event,
            MarketEvent::QueryInvalidated {
                refetch_scheduled: true,
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_routing_resumes_after_reconnect() {
        let h = harness();
        let key = QueryKey::scoped("orders", "V1");
        h.cache.insert_fresh(key.clone());

        h.manager
            .set_actor(ActorId::from("vendor-1"), vec![vendor_orders()])
            .await
            .unwrap();
        pause().await;

        h.push.emit(&vendor_orders(), ChannelSignal::Closed).await;
        pause().await;
        assert_eq!(h.manager.status(), ConnectionStatus::Reconnecting);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.manager.status(), ConnectionStatus::Connected);
        assert_eq!(h.push.open_count(&vendor_orders()), 2);

        h.push.emit(&vendor_orders(), order_changed("Y")).await;
        pause().await;
        assert!(h.cache.is_stale(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_stops_invalidation() {
        let h = harness();
        let key = QueryKey::scoped("orders", "V1");
        h.cache.insert_fresh(key.clone());

        h.manager
            .set_actor(ActorId::from("vendor-1"), vec![vendor_orders()])
            .await
            .unwrap();
        pause().await;
        h.manager.logout().await;
        pause().await;

        assert_eq!(h.manager.active_subscriptions(), 0);
        assert_eq!(h.manager.status(), ConnectionStatus::Disconnected);
        assert!(!h.push.emit(&vendor_orders(), order_changed("X")).await);
        pause().await;
        assert!(!h.cache.is_stale(&key));
    }
}
