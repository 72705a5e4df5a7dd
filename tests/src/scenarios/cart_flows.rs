//! # Cart Flows
//!
//! Totals, promo codes and persistence across the cart engine, the backend
//! adapter and the event bus.
//!
//! ## Scenarios (flat vendor fee 2.99, service fee 0.50)
//!
//! 1. Empty → add A@V1 10.00 ×2 ⇒ total 23.49
//! 2. Add B@V2 15.00 ×1 ⇒ total 41.48
//! 3. Set A to 0 ⇒ total 18.49
//! 4. Apply SAVE5 (5.00) ⇒ total 13.49
//! 5. Restart from `{[B×1], SAVE5}` ⇒ same as 4 after re-validation

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use mk_01_cart_state::{
        CartApi, CartError, CartItem, CartTotals, HydrationOutcome, KeyValueStorage,
        PersistedCart, PERSISTED_CART_VERSION,
    };
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, MarketEvent};
    use shared_types::{Money, ProductId};

    use crate::fixtures::{
        backend, cart_config, cart_store, memory_storage, product_a, product_b, settle,
    };

    fn cents(value: i64) -> Money {
        Money::from_cents(value)
    }

    /// Totals after scenario 4.
    fn scenario_four_totals() -> CartTotals {
        CartTotals {
            subtotal: cents(1500),
            delivery_fee: cents(299),
            service_fee: cents(50),
            discount: cents(500),
            total: cents(1349),
        }
    }

    // =============================================================================
    // SCENARIOS 1-4: LOCAL MUTATIONS + PROMO
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenarios_one_to_four() {
        let backend = backend();
        let store = cart_store(&backend, memory_storage());

        // 1
        let cart = store.add_item(product_a(), 2);
        assert_eq!(cart.totals().subtotal, cents(2000));
        assert_eq!(cart.totals().delivery_fee, cents(299));
        assert_eq!(cart.totals().total, cents(2349));

        // 2
        let cart = store.add_item(product_b(), 1);
        assert_eq!(cart.totals().subtotal, cents(3500));
        assert_eq!(cart.totals().delivery_fee, cents(598));
        assert_eq!(cart.totals().total, cents(4148));
        assert_eq!(cart.vendor_groups().len(), 2);

        // 3
        let cart = store.update_quantity(&ProductId::from("A"), 0);
        assert!(cart.item(&ProductId::from("A")).is_none());
        assert_eq!(cart.totals().subtotal, cents(1500));
        assert_eq!(cart.totals().delivery_fee, cents(299));
        assert_eq!(cart.totals().total, cents(1849));
        assert_eq!(store.item_count(), 1);

        // 4
        let discount = store.apply_promo_code("SAVE5").await.unwrap();
        assert_eq!(discount, cents(500));
        assert_eq!(*store.snapshot().totals(), scenario_four_totals());

        // Server reconciliation agrees with the local numbers.
        settle().await;
        assert!(!store.has_pending_sync());
        assert_eq!(*store.snapshot().totals(), scenario_four_totals());
    }

    // =============================================================================
    // SCENARIO 5: RESTART + PROMO RE-VALIDATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_restart_restores_items_and_promo() {
        let backend = backend();
        let storage = memory_storage();

        {
            let store = cart_store(&backend, storage.clone());
            store.add_item(product_a(), 2);
            store.add_item(product_b(), 1);
            store.update_quantity(&ProductId::from("A"), 0);
            store.apply_promo_code("SAVE5").await.unwrap();
            settle().await;
        }

        let restarted = cart_store(&backend, storage.clone());
        assert_eq!(
            restarted.hydrate(),
            HydrationOutcome::Restored {
                items: 1,
                promo_code: Some("SAVE5".into())
            }
        );

        // Discount is not persisted; totals come from the fee schedule alone.
        let cart = restarted.snapshot();
        assert_eq!(cart.item(&ProductId::from("B")).map(|i| i.quantity), Some(1));
        assert_eq!(cart.promo_code(), Some("SAVE5"));
        assert_eq!(cart.totals().discount, Money::ZERO);
        assert_eq!(cart.totals().total, cents(1849));

        assert_eq!(restarted.revalidate_promo().await.unwrap(), cents(500));
        assert_eq!(*restarted.snapshot().totals(), scenario_four_totals());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_with_withdrawn_promo_clears_it() {
        let backend = backend();
        let storage = memory_storage();
        let persisted = PersistedCart {
            version: PERSISTED_CART_VERSION,
            items: vec![CartItem::new(product_b(), 1)],
            promo_code: Some("SAVE5".into()),
        };
        storage
            .set(
                &cart_config().storage_key(),
                &serde_json::to_string(&persisted).unwrap(),
            )
            .unwrap();
        backend.remove_promo("SAVE5");

        let store = cart_store(&backend, storage.clone());
        store.hydrate();
        let err = store.revalidate_promo().await.unwrap_err();
        assert!(matches!(err, CartError::PromoRejected { .. }));

        let cart = store.snapshot();
        assert_eq!(cart.promo_code(), None);
        assert_eq!(cart.totals().total, cents(1849));

        // The cleared code is persisted too.
        let again = cart_store(&backend, storage);
        assert_eq!(
            again.hydrate(),
            HydrationOutcome::Restored {
                items: 1,
                promo_code: None
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_blob_starts_empty() {
        let backend = backend();
        let storage = memory_storage();
        storage
            .set(&cart_config().storage_key(), "{not json")
            .unwrap();

        let store = cart_store(&backend, storage.clone());
        assert_eq!(store.hydrate(), HydrationOutcome::Corrupt);
        assert_eq!(store.item_count(), 0);
        assert_eq!(storage.get(&cart_config().storage_key()).unwrap(), None);
    }

    // =============================================================================
    // OUT-OF-ORDER SYNC RESPONSES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_slow_sync_response_never_overwrites_newer_state() {
        let backend = backend();
        let bus = Arc::new(InMemoryEventBus::new());
        let store = cart_store(&backend, memory_storage()).with_events(bus.clone());
        let mut cart_events = bus.subscribe(EventFilter::topics(vec![EventTopic::Cart]));

        backend.delay_next(Duration::from_secs(5));
        store.add_item(product_a(), 1);
        store.add_item(product_a(), 1);
        store.add_item(product_b(), 3);
        settle().await;

        let events = cart_events.drain();
        assert!(events.contains(&MarketEvent::CartSynced { seq: 3 }));
        assert!(events.contains(&MarketEvent::CartSyncDiscarded {
            seq: 1,
            last_applied: 3
        }));

        let cart = store.snapshot();
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.totals().subtotal, cents(6500));
        assert_eq!(cart.totals().total, cents(6500 + 598 + 50));
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_outage_keeps_cart_and_pending_flag() {
        let backend = backend();
        let bus = Arc::new(InMemoryEventBus::new());
        let store = cart_store(&backend, memory_storage()).with_events(bus.clone());
        let mut cart_events = bus.subscribe(EventFilter::topics(vec![EventTopic::Cart]));

        backend.fail_next(u32::MAX);
        store.add_item(product_a(), 2);
        settle().await;

        assert_eq!(store.item_count(), 2);
        assert!(store.has_pending_sync());
        assert!(matches!(
            cart_events.drain().as_slice(),
            [MarketEvent::CartSyncFailed { seq: 1, .. }]
        ));

        // Recovery: the next mutation's sync acknowledges everything.
        backend.fail_next(0);
        store.add_item(product_b(), 1);
        settle().await;
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_adopts_server_cart() {
        let backend = backend();
        let store = cart_store(&backend, memory_storage());
        backend.seed_line("A", 3);
        backend.seed_line("B", 1);

        assert!(store.refresh_from_remote().await.unwrap());
        let cart = store.snapshot();
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.totals().subtotal, cents(4500));
        assert_eq!(cart.totals().total, cents(4500 + 598 + 50));
        assert_eq!(cart.vendor_groups().len(), 2);
    }
}
