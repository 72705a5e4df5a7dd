//! # Session Flows
//!
//! Full `ClientSession` lifecycles: start, shop, receive pushes, restart.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use client_runtime::{ClientConfig, ClientSession, SessionPorts};
    use mk_01_cart_state::{CartApi, HydrationOutcome, InMemoryCartBackend};
    use mk_02_realtime_sync::{ChannelSignal, InMemoryPushChannel, InMemoryQueryCache, RealtimeApi};
    use shared_bus::{EventFilter, EventTopic, MarketEvent};
    use shared_types::{ActorId, ChangeKind, Money, QueryKey, ResourceKind, ResourceScope};

    use crate::fixtures::{backend, cart_config, product_a, product_b, settle};

    struct Ports {
        backend: Arc<InMemoryCartBackend>,
        push: Arc<InMemoryPushChannel>,
        cache: Arc<InMemoryQueryCache>,
    }

    impl Ports {
        fn new() -> Self {
            Self {
                backend: backend(),
                push: Arc::new(InMemoryPushChannel::new(16)),
                cache: Arc::new(InMemoryQueryCache::new()),
            }
        }

        fn session_ports(&self) -> SessionPorts {
            SessionPorts {
                cart_gateway: self.backend.clone(),
                promo_validator: self.backend.clone(),
                push_channel: self.push.clone(),
                query_cache: self.cache.clone(),
            }
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            cart: cart_config(),
            ..ClientConfig::for_testing()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_from_disk_restores_scenario_four() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..config()
        };
        let ports = Ports::new();

        let session = ClientSession::start(config.clone(), ports.session_ports())
            .await
            .unwrap();
        session.cart().add_item(product_a(), 2);
        session.cart().add_item(product_b(), 1);
        session.cart().update_quantity(&"A".into(), 0);
        session.cart().apply_promo_code("SAVE5").await.unwrap();
        let before = *session.cart().snapshot().totals();
        settle().await;
        session.shutdown().await.unwrap();

        // Startup re-validates the restored promo code.
        let restarted = ClientSession::start(config, ports.session_ports())
            .await
            .unwrap();
        assert_eq!(
            restarted.hydration(),
            &HydrationOutcome::Restored {
                items: 1,
                promo_code: Some("SAVE5".into())
            }
        );
        assert_eq!(*restarted.cart().snapshot().totals(), before);
        assert_eq!(before.total, Money::from_cents(1349));
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_change_reaches_cache_and_badges() {
        let ports = Ports::new();
        let session = ClientSession::start(config(), ports.session_ports())
            .await
            .unwrap();

        let inbox = ResourceScope::user(ResourceKind::Notifications, "u-1");
        let unread = QueryKey::scoped("unread_count", "u-1");
        ports.cache.insert_fresh(unread.clone());

        session
            .sign_in(ActorId::from("u-1"), vec![inbox.clone()])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        ports
            .push
            .emit(
                &inbox,
                ChannelSignal::Change {
                    resource: ResourceKind::Notifications,
                    resource_id: "n-9".into(),
                    kind: ChangeKind::Insert,
                },
            )
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The push itself never changes the badge.
        assert!(ports.cache.is_stale(&unread));
        assert_eq!(session.badges().get(&unread), 0);

        ports.cache.complete_refetch(&unread);
        assert!(session.refetch_completed(&unread, Some(3)));
        assert_eq!(session.badges().get(&unread), 3);
        assert_eq!(session.router().pending_refetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_bus_carries_cart_and_connection_events() {
        let ports = Ports::new();
        let session = ClientSession::start(config(), ports.session_ports())
            .await
            .unwrap();
        let mut events = session
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Cart, EventTopic::Connection]));

        session.cart().add_item(product_a(), 1);
        session
            .sign_in(
                ActorId::from("vendor-1"),
                vec![ResourceScope::vendor(ResourceKind::Orders, "V1")],
            )
            .await
            .unwrap();
        settle().await;

        let events = events.drain();
        assert!(events.contains(&MarketEvent::CartSynced { seq: 1 }));
        assert!(events
            .iter()
            .any(|event| matches!(event, MarketEvent::ConnectionStatusChanged { .. })));
        assert!(session.realtime().status().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_actor_resets_badges() {
        let ports = Ports::new();
        let session = ClientSession::start(config(), ports.session_ports())
            .await
            .unwrap();
        let key = QueryKey::scoped("unread_messages", "u-1");

        session
            .sign_in(
                ActorId::from("u-1"),
                vec![ResourceScope::user(ResourceKind::Messages, "u-1")],
            )
            .await
            .unwrap();
        session.refetch_completed(&key, Some(7));
        assert_eq!(session.badges().get(&key), 7);

        session
            .sign_in(
                ActorId::from("u-2"),
                vec![ResourceScope::user(ResourceKind::Messages, "u-2")],
            )
            .await
            .unwrap();
        assert_eq!(session.badges().get(&key), 0);
        assert_eq!(session.realtime().active_subscriptions(), 1);
        assert_eq!(session.realtime().actor(), Some(ActorId::from("u-2")));
    }
}
