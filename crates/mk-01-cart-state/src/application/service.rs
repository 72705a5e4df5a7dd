//! # Cart Store
//!
//! Application service owning the cart aggregate.
//!
//! ```text
//! caller ──add_item()──→ [lock] mutate + recompute + next seq [unlock]
//!                              │
//!                              ├──→ persistence::schedule_flush  (throttled)
//!                              └──→ pipeline::dispatch_sync      (detached)
//!                                        │
//!                                        ↓ response for seq
//!                              [lock] apply if seq ≥ last_applied [unlock]
//! ```
//!
//! The aggregate lock is a `parking_lot::Mutex` and is never held across an
//! `.await`.

use crate::application::{persistence, pipeline};
use crate::config::CartConfig;
use crate::domain::{
    Cart, CartError, PersistedCart, ProductSnapshot, PromoDecision, SyncRequest, SyncSequence,
    PERSISTED_CART_VERSION,
};
use crate::ports::{CartApi, CartSyncGateway, KeyValueStorage, PromoValidator};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, MarketEvent};
use shared_types::{Money, ProductId};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Aggregate plus its sequence counter, guarded together.
#[derive(Debug)]
pub(crate) struct CartState {
    pub(crate) cart: Cart,
    pub(crate) sequence: SyncSequence,
    /// Bumped whenever a promo validation starts or the code is cleared.
    pub(crate) promo_claim: u64,
}

/// What a promo validation saw when it started.
#[derive(Debug, Clone, Copy)]
struct PromoTicket {
    issued: u64,
    claim: u64,
    subtotal: Money,
}

/// Shared state behind every `CartStore` clone and detached task.
pub(crate) struct CartInner {
    pub(crate) config: CartConfig,
    pub(crate) state: Mutex<CartState>,
    pub(crate) gateway: Arc<dyn CartSyncGateway>,
    pub(crate) promo: Arc<dyn PromoValidator>,
    pub(crate) storage: Arc<dyn KeyValueStorage>,
    pub(crate) events: RwLock<Option<Arc<dyn EventPublisher>>>,
    pub(crate) flush_pending: AtomicBool,
}

impl CartInner {
    pub(crate) async fn publish(&self, event: MarketEvent) {
        let publisher = self.events.read().clone();
        if let Some(publisher) = publisher {
            publisher.publish(event).await;
        }
    }
}

/// Result of reading the persisted subset at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// A persisted cart was restored.
    Restored {
        /// Lines restored.
        items: usize,
        /// Promo code restored (discount pending revalidation).
        promo_code: Option<String>,
    },
    /// Nothing persisted.
    Empty,
    /// The blob could not be decoded and was discarded.
    Corrupt,
    /// The store could not be read; starting empty.
    Unavailable,
}

/// Sequence counters for observers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub issued: u64,
    pub last_applied: u64,
    pub pending: bool,
}

/// Cart store - optimistic, locally authoritative cart replica.
///
/// Cheap to clone; clones share one aggregate.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

impl CartStore {
    /// Create an empty store. Call [`CartStore::hydrate`] to restore a
    /// persisted cart.
    pub fn new(
        config: CartConfig,
        gateway: Arc<dyn CartSyncGateway>,
        promo: Arc<dyn PromoValidator>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let cart = Cart::empty(&config.fees);
        Self {
            inner: Arc::new(CartInner {
                config,
                state: Mutex::new(CartState {
                    cart,
                    sequence: SyncSequence::default(),
                    promo_claim: 0,
                }),
                gateway,
                promo,
                storage,
                events: RwLock::new(None),
                flush_pending: AtomicBool::new(false),
            }),
        }
    }

    /// Publish sync outcomes on `publisher`.
    #[must_use]
    pub fn with_events(self, publisher: Arc<dyn EventPublisher>) -> Self {
        *self.inner.events.write() = Some(publisher);
        self
    }

    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    /// Restore the persisted `{items, promo_code}` subset.
    ///
    /// Totals are recomputed from the active fee schedule. A restored promo
    /// code carries no discount until [`CartStore::revalidate_promo`]
    /// succeeds.
    pub fn hydrate(&self) -> HydrationOutcome {
        let key = self.inner.config.storage_key();
        let blob = match self.inner.storage.get(&key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(key = %key, "No persisted cart");
                return HydrationOutcome::Empty;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Cart storage unreadable; starting empty");
                return HydrationOutcome::Unavailable;
            }
        };

        let persisted = match serde_json::from_str::<PersistedCart>(&blob) {
            Ok(persisted) if persisted.version <= PERSISTED_CART_VERSION => persisted,
            Ok(persisted) => {
                warn!(key = %key, version = persisted.version, "Unsupported persisted cart version; discarding");
                self.discard_blob(&key);
                return HydrationOutcome::Corrupt;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Persisted cart undecodable; discarding");
                self.discard_blob(&key);
                return HydrationOutcome::Corrupt;
            }
        };

        let cart = Cart::from_persisted(persisted, &self.inner.config.fees);
        let items = cart.items().count();
        let promo_code = cart.promo_code().map(str::to_string);
        self.inner.state.lock().cart = cart;

        info!(items, promo = ?promo_code, "Cart hydrated");
        HydrationOutcome::Restored { items, promo_code }
    }

    fn discard_blob(&self, key: &str) {
        if let Err(err) = self.inner.storage.delete(key) {
            warn!(key = %key, error = %err, "Failed to delete discarded cart blob");
        }
    }

    /// Write the current persisted subset immediately.
    pub fn flush_now(&self) -> Result<(), CartError> {
        persistence::flush(&self.inner)
    }

    /// Re-check a hydrated promo code and restore its discount.
    ///
    /// Rejection clears the code. Transport errors leave it in place.
    pub async fn revalidate_promo(&self) -> Result<Money, CartError> {
        let (code, ticket) = {
            let mut state = self.inner.state.lock();
            let code = state
                .cart
                .promo_code()
                .map(str::to_string)
                .ok_or(CartError::NoPromoCode)?;
            (code, Self::claim_promo(&mut state))
        };

        match self.inner.promo.validate(&code, ticket.subtotal).await? {
            PromoDecision::Accepted { discount } if !discount.is_zero() => {
                self.commit_promo(&code, discount, ticket)?;
                Ok(discount)
            }
            decision => {
                let reason = rejection_reason(decision);
                {
                    let mut state = self.inner.state.lock();
                    if !Self::ticket_valid(&state, ticket) {
                        return Err(CartError::PromoSuperseded { code });
                    }
                    state.cart.clear_promo();
                    state.cart.recompute(&self.inner.config.fees);
                }
                persistence::schedule_flush(&self.inner);
                info!(code = %code, reason = %reason, "Hydrated promo code no longer valid; cleared");
                Err(CartError::PromoRejected { code, reason })
            }
        }
    }

    /// Fetch the backend cart and adopt it wholesale.
    ///
    /// Returns `Ok(false)` without touching the cart when any local mutation
    /// is still unacknowledged, whether it was issued before or during the
    /// fetch. The fetched cart may predate that edit; the edit's own sync
    /// reconciles instead.
    pub async fn refresh_from_remote(&self) -> Result<bool, CartError> {
        let issued_before = {
            let state = self.inner.state.lock();
            if state.sequence.has_pending() {
                debug!(
                    issued = state.sequence.issued(),
                    last_applied = state.sequence.last_applied(),
                    "Local edits unacknowledged; remote cart not fetched"
                );
                return Ok(false);
            }
            state.sequence.issued()
        };
        let remote = self.inner.gateway.fetch().await?;

        let seq = {
            let mut state = self.inner.state.lock();
            if state.sequence.issued() != issued_before {
                debug!(
                    issued_before,
                    issued_now = state.sequence.issued(),
                    "Remote cart superseded by local mutation; not adopted"
                );
                return Ok(false);
            }
            // Claim a fresh sequence so older in-flight responses are dropped.
            let seq = state.sequence.next();
            state.cart.apply_authoritative(&remote, true);
            state.sequence.mark_applied(seq);
            seq
        };

        persistence::schedule_flush(&self.inner);
        info!(seq, "Adopted authoritative cart");
        self.inner.publish(MarketEvent::CartSynced { seq }).await;
        Ok(true)
    }

    pub fn sync_status(&self) -> SyncStatus {
        let state = self.inner.state.lock();
        SyncStatus {
            issued: state.sequence.issued(),
            last_applied: state.sequence.last_applied(),
            pending: state.sequence.has_pending(),
        }
    }

    /// Run a local transition and, if it changed anything, start the remote
    /// phase and schedule a persistence write.
    fn mutate(
        &self,
        op: &'static str,
        transition: impl FnOnce(&mut Cart) -> bool,
        request: impl FnOnce(&Cart) -> SyncRequest,
    ) -> Cart {
        let (snapshot, dispatch) = {
            let mut state = self.inner.state.lock();
            if !transition(&mut state.cart) {
                return state.cart.clone();
            }
            state.cart.recompute(&self.inner.config.fees);
            let seq = state.sequence.next();
            let request = request(&state.cart);
            (state.cart.clone(), (seq, request))
        };

        let (seq, request) = dispatch;
        debug!(
            op,
            seq,
            items = snapshot.item_count(),
            total = %snapshot.totals().total,
            "Local cart transition applied"
        );
        persistence::schedule_flush(&self.inner);
        pipeline::dispatch_sync(&self.inner, seq, request);
        snapshot
    }

    /// Start a promo validation. Any validation already in flight loses.
    fn claim_promo(state: &mut CartState) -> PromoTicket {
        state.promo_claim += 1;
        PromoTicket {
            issued: state.sequence.issued(),
            claim: state.promo_claim,
            subtotal: state.cart.totals().subtotal,
        }
    }

    /// No cart mutation, promo clear or newer validation since `ticket`.
    fn ticket_valid(state: &CartState, ticket: PromoTicket) -> bool {
        state.sequence.issued() == ticket.issued && state.promo_claim == ticket.claim
    }

    fn commit_promo(
        &self,
        code: &str,
        discount: Money,
        ticket: PromoTicket,
    ) -> Result<(), CartError> {
        {
            let mut state = self.inner.state.lock();
            if !Self::ticket_valid(&state, ticket) {
                debug!(
                    code = %code,
                    issued_before = ticket.issued,
                    issued_now = state.sequence.issued(),
                    "Cart changed during promo validation; not committed"
                );
                return Err(CartError::PromoSuperseded {
                    code: code.to_string(),
                });
            }
            state.cart.set_promo(code, discount);
            state.cart.recompute(&self.inner.config.fees);
        }
        persistence::schedule_flush(&self.inner);
        info!(code = %code, discount = %discount, "Promo code applied");
        Ok(())
    }

    fn replace_items(cart: &Cart) -> SyncRequest {
        SyncRequest::ReplaceItems {
            items: cart.sync_lines(),
        }
    }
}

fn rejection_reason(decision: PromoDecision) -> String {
    match decision {
        PromoDecision::Rejected { reason } => reason,
        PromoDecision::Accepted { .. } => "code grants no discount".to_string(),
    }
}

#[async_trait]
impl CartApi for CartStore {
    fn add_item(&self, product: ProductSnapshot, quantity: i64) -> Cart {
        self.mutate(
            "add_item",
            |cart| cart.add_item(product, quantity),
            Self::replace_items,
        )
    }

    fn remove_item(&self, product_id: &ProductId) -> Cart {
        self.mutate(
            "remove_item",
            |cart| cart.remove_item(product_id),
            |_| SyncRequest::RemoveItem {
                product_id: product_id.clone(),
            },
        )
    }

    fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Cart {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        self.mutate(
            "update_quantity",
            |cart| cart.update_quantity(product_id, quantity),
            Self::replace_items,
        )
    }

    fn clear(&self) -> Cart {
        self.inner.state.lock().promo_claim += 1;
        self.mutate("clear", Cart::clear, |_| SyncRequest::Clear)
    }

    async fn apply_promo_code(&self, code: &str) -> Result<Money, CartError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CartError::EmptyPromoCode);
        }

        let ticket = Self::claim_promo(&mut self.inner.state.lock());
        match self.inner.promo.validate(code, ticket.subtotal).await? {
            PromoDecision::Accepted { discount } if !discount.is_zero() => {
                self.commit_promo(code, discount, ticket)?;
                Ok(discount)
            }
            decision => {
                let reason = rejection_reason(decision);
                debug!(code = %code, reason = %reason, "Promo code rejected");
                Err(CartError::PromoRejected {
                    code: code.to_string(),
                    reason,
                })
            }
        }
    }

    fn clear_promo_code(&self) -> Cart {
        let (snapshot, changed) = {
            let mut state = self.inner.state.lock();
            state.promo_claim += 1;
            let changed = state.cart.clear_promo();
            if changed {
                state.cart.recompute(&self.inner.config.fees);
            }
            (state.cart.clone(), changed)
        };
        if changed {
            persistence::schedule_flush(&self.inner);
            debug!("Promo code cleared");
        }
        snapshot
    }

    fn item_count(&self) -> u32 {
        self.inner.state.lock().cart.item_count()
    }

    fn snapshot(&self) -> Cart {
        self.inner.state.lock().cart.clone()
    }

    fn has_pending_sync(&self) -> bool {
        self.inner.state.lock().sequence.has_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryCartBackend, InMemoryStorage};
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use std::time::Duration;

    fn product(id: &str, vendor: &str, cents: i64) -> ProductSnapshot {
        ProductSnapshot::new(id, vendor, Money::from_cents(cents))
    }

    fn backend() -> Arc<InMemoryCartBackend> {
        Arc::new(
            InMemoryCartBackend::new(Default::default())
                .with_product(product("A", "V1", 1000))
                .with_product(product("B", "V2", 1500))
                .with_promo("SAVE5", Money::from_cents(500))
                .with_promo("SAVE2", Money::from_cents(200))
                .with_promo("ZERO", Money::ZERO),
        )
    }

    fn store_with(
        config: CartConfig,
        backend: Arc<InMemoryCartBackend>,
        storage: Arc<InMemoryStorage>,
    ) -> CartStore {
        CartStore::new(config, backend.clone(), backend, storage)
    }

    fn store() -> (CartStore, Arc<InMemoryCartBackend>, Arc<InMemoryStorage>) {
        let backend = backend();
        let storage = Arc::new(InMemoryStorage::new());
        let store = store_with(CartConfig::for_testing(), backend.clone(), storage.clone());
        (store, backend, storage)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_phase_is_immediate() {
        let (store, backend, _) = store();
        backend.delay_next(Duration::from_secs(60));

        let cart = store.add_item(product("A", "V1", 1000), 2);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.totals().total, Money::from_cents(2349));
        assert!(store.has_pending_sync());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_discarded() {
        let (store, backend, _) = store();
        let bus = Arc::new(InMemoryEventBus::new());
        let store = store.with_events(bus.clone());
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Cart]));

        // First sync is slow, second is fast: responses arrive out of order.
        backend.delay_next(Duration::from_secs(10));
        backend.delay_next(Duration::from_millis(10));
        store.add_item(product("A", "V1", 1000), 1);
        store.add_item(product("B", "V2", 1500), 1);

        settle().await;
        settle().await;

        let events = sub.drain();
        assert!(events.contains(&MarketEvent::CartSynced { seq: 2 }));
        assert!(events.contains(&MarketEvent::CartSyncDiscarded {
            seq: 1,
            last_applied: 2
        }));
        assert_eq!(store.snapshot().item_count(), 2);
        assert_eq!(store.sync_status().last_applied, 2);
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_failure_keeps_optimistic_state() {
        let (store, backend, _) = store();
        let bus = Arc::new(InMemoryEventBus::new());
        let store = store.with_events(bus.clone());
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Cart]));
        backend.fail_next(10);

        store.add_item(product("A", "V1", 1000), 2);
        settle().await;

        assert_eq!(store.item_count(), 2);
        assert!(store.has_pending_sync());
        assert_eq!(backend.sync_calls(), 3);
        assert!(matches!(
            sub.drain().as_slice(),
            [MarketEvent::CartSyncFailed { seq: 1, attempts: 3, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried() {
        let (store, backend, _) = store();
        backend.fail_next(1);

        store.add_item(product("A", "V1", 1000), 1);
        settle().await;

        assert_eq!(backend.sync_calls(), 2);
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_mutation_skips_remote_phase() {
        let (store, backend, storage) = store();
        store.remove_item(&ProductId::from("missing"));
        store.update_quantity(&ProductId::from("missing"), 3);
        settle().await;

        assert_eq!(backend.sync_calls(), 0);
        assert_eq!(storage.writes(), 0);
        assert_eq!(store.sync_status().issued, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_promo_rejection_leaves_cart_unchanged() {
        let (store, _, _) = store();
        store.add_item(product("A", "V1", 1000), 1);
        let before = store.snapshot();

        let err = store.apply_promo_code("BOGUS").await.unwrap_err();
        assert!(matches!(err, CartError::PromoRejected { .. }));
        let err = store.apply_promo_code("ZERO").await.unwrap_err();
        assert!(matches!(err, CartError::PromoRejected { .. }));
        assert!(matches!(
            store.apply_promo_code("  ").await,
            Err(CartError::EmptyPromoCode)
        ));

        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_promo_accept_then_clear() {
        let (store, _, _) = store();
        store.add_item(product("A", "V1", 1000), 2);
        settle().await;
        let before = store.snapshot().totals().total;

        let discount = store.apply_promo_code("SAVE5").await.unwrap();
        assert_eq!(discount, Money::from_cents(500));
        let cart = store.snapshot();
        assert_eq!(cart.promo_code(), Some("SAVE5"));
        assert_eq!(cart.totals().total, before - discount);

        let cart = store.clear_promo_code();
        assert_eq!(cart.promo_code(), None);
        assert_eq!(cart.totals().total, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discount_survives_sync_response() {
        let (store, _, _) = store();
        store.add_item(product("A", "V1", 1000), 2);
        store.apply_promo_code("SAVE5").await.unwrap();
        store.add_item(product("A", "V1", 1000), 1);
        settle().await;

        let totals = *store.snapshot().totals();
        assert_eq!(totals.discount, Money::from_cents(500));
        assert_eq!(totals.total, Money::from_cents(3000 + 299 + 50 - 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrate_restores_subset_and_revalidates() {
        let (store, backend, storage) = store();
        store.add_item(product("B", "V2", 1500), 1);
        store.apply_promo_code("SAVE5").await.unwrap();
        settle().await;

        let restarted = store_with(CartConfig::for_testing(), backend, storage);
        let outcome = restarted.hydrate();
        assert_eq!(
            outcome,
            HydrationOutcome::Restored {
                items: 1,
                promo_code: Some("SAVE5".into())
            }
        );
        assert_eq!(restarted.snapshot().totals().discount, Money::ZERO);

        restarted.revalidate_promo().await.unwrap();
        assert_eq!(restarted.snapshot(), store.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_revalidate_clears_rejected_code() {
        let (store, backend, storage) = store();
        store.add_item(product("B", "V2", 1500), 1);
        store.apply_promo_code("SAVE5").await.unwrap();
        settle().await;
        backend.remove_promo("SAVE5");

        let restarted = store_with(CartConfig::for_testing(), backend, storage);
        restarted.hydrate();
        let err = restarted.revalidate_promo().await.unwrap_err();
        assert!(matches!(err, CartError::PromoRejected { .. }));
        assert_eq!(restarted.snapshot().promo_code(), None);
        assert!(matches!(
            restarted.revalidate_promo().await,
            Err(CartError::NoPromoCode)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrate_corrupt_blob() {
        let (store, _, storage) = store();
        storage.set("marketplace:cart", "{not json").unwrap();

        assert_eq!(store.hydrate(), HydrationOutcome::Corrupt);
        assert_eq!(storage.get("marketplace:cart").unwrap(), None);
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrate_empty_and_unavailable() {
        let (store, _, storage) = store();
        assert_eq!(store.hydrate(), HydrationOutcome::Empty);
        storage.set_failing(true);
        assert_eq!(store.hydrate(), HydrationOutcome::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_not_propagated() {
        let (store, _, storage) = store();
        storage.set_failing(true);

        let cart = store.add_item(product("A", "V1", 1000), 1);
        assert_eq!(cart.item_count(), 1);
        assert!(store.flush_now().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_adopts_remote_items() {
        let (store, backend, _) = store();
        backend.seed_line("B", 3);

        assert!(store.refresh_from_remote().await.unwrap());
        let cart = store.snapshot();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.totals().subtotal, Money::from_cents(4500));
        assert!(!store.has_pending_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_superseded_by_local_mutation() {
        let (store, backend, _) = store();
        backend.seed_line("B", 3);
        backend.delay_next(Duration::from_secs(1));

        let refresh = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_from_remote().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.add_item(product("A", "V1", 1000), 1);

        assert!(!refresh.await.unwrap().unwrap());
        assert!(store.snapshot().item(&ProductId::from("A")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_keeps_edit_whose_sync_is_in_flight() {
        let (store, backend, _) = store();
        backend.delay_next(Duration::from_secs(10));
        store.add_item(product("A", "V1", 1000), 2);
        tokio::time::sleep(Duration::from_millis(1)).await;

        // The server has not seen the add yet; its cart must not win.
        assert!(!store.refresh_from_remote().await.unwrap());
        assert_eq!(store.item_count(), 2);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(store.item_count(), 2);
        assert!(!store.has_pending_sync());

        assert!(store.refresh_from_remote().await.unwrap());
        assert_eq!(store.item_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_during_promo_validation_wins() {
        let (store, backend, _) = store();
        store.add_item(product("A", "V1", 1000), 2);
        settle().await;

        backend.delay_next(Duration::from_secs(5));
        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.apply_promo_code("SAVE5").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.clear();

        let err = slow.await.unwrap().unwrap_err();
        assert!(matches!(err, CartError::PromoSuperseded { .. }));
        let cart = store.snapshot();
        assert!(cart.is_empty());
        assert_eq!(cart.promo_code(), None);
        assert_eq!(cart.totals().discount, Money::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_promo_request_wins() {
        let (store, backend, _) = store();
        store.add_item(product("A", "V1", 1000), 2);
        settle().await;

        backend.delay_next(Duration::from_secs(5));
        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.apply_promo_code("SAVE5").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            store.apply_promo_code("SAVE2").await.unwrap(),
            Money::from_cents(200)
        );

        assert!(matches!(
            slow.await.unwrap(),
            Err(CartError::PromoSuperseded { .. })
        ));
        let cart = store.snapshot();
        assert_eq!(cart.promo_code(), Some("SAVE2"));
        assert_eq!(cart.totals().discount, Money::from_cents(200));
    }
}
