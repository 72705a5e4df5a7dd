//! In-process cart backend.
//!
//! Prices lines from its own catalogue, keeps the server-side line set and
//! validates promo codes. Failures and latencies can be scripted per call so
//! tests can reproduce retries and out-of-order responses.

use crate::domain::{
    compute_totals, vendor_summaries, AuthoritativeCart, CartError, CartItem, FeeSchedule,
    PricedLine, ProductSnapshot, PromoDecision, SyncRequest,
};
use crate::ports::{CartSyncGateway, PromoValidator};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Money, ProductId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Mock cart + promo backend.
pub struct InMemoryCartBackend {
    fees: FeeSchedule,
    catalogue: Mutex<HashMap<ProductId, ProductSnapshot>>,
    promos: Mutex<HashMap<String, Money>>,
    lines: Mutex<BTreeMap<ProductId, u32>>,
    delays: Mutex<VecDeque<Duration>>,
    fail_next: AtomicU32,
    sync_calls: AtomicU64,
}

impl InMemoryCartBackend {
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            fees,
            catalogue: Mutex::new(HashMap::new()),
            promos: Mutex::new(HashMap::new()),
            lines: Mutex::new(BTreeMap::new()),
            delays: Mutex::new(VecDeque::new()),
            fail_next: AtomicU32::new(0),
            sync_calls: AtomicU64::new(0),
        }
    }

    /// Add a product to the catalogue.
    #[must_use]
    pub fn with_product(self, product: ProductSnapshot) -> Self {
        self.set_price(product);
        self
    }

    /// Register a promo code granting `discount`.
    #[must_use]
    pub fn with_promo(self, code: &str, discount: Money) -> Self {
        self.promos.lock().insert(code.to_uppercase(), discount);
        self
    }

    /// Insert or reprice a catalogue entry.
    pub fn set_price(&self, product: ProductSnapshot) {
        self.catalogue.lock().insert(product.id.clone(), product);
    }

    pub fn remove_promo(&self, code: &str) {
        self.promos.lock().remove(&code.to_uppercase());
    }

    /// Put a line into the server-side cart directly.
    pub fn seed_line(&self, product_id: &str, quantity: u32) {
        self.lines.lock().insert(ProductId::from(product_id), quantity);
    }

    /// Delay the next call (sync, fetch or validate) by `delay`.
    /// Queued delays are consumed in call order.
    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().push_back(delay);
    }

    /// Fail the next `count` sync/fetch calls with a transient error.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Sync calls received, including failed ones.
    pub fn sync_calls(&self) -> u64 {
        self.sync_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn simulate_failure(&self) -> Result<(), CartError> {
        let failed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CartError::Remote("simulated backend outage".into()));
        }
        Ok(())
    }

    /// Price the server-side lines. Products missing from the catalogue are
    /// dropped.
    fn priced_cart(&self) -> AuthoritativeCart {
        let catalogue = self.catalogue.lock();
        let lines = self.lines.lock();

        let items: BTreeMap<ProductId, CartItem> = lines
            .iter()
            .filter_map(|(id, quantity)| {
                catalogue
                    .get(id)
                    .map(|product| (id.clone(), CartItem::new(product.clone(), *quantity)))
            })
            .collect();
        let totals = compute_totals(&items, Money::ZERO, &self.fees);

        AuthoritativeCart {
            items: items
                .values()
                .map(|item| PricedLine {
                    product_id: item.product_id.clone(),
                    vendor_id: item.vendor_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.price_snapshot,
                })
                .collect(),
            vendors: vendor_summaries(&items),
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            service_fee: totals.service_fee,
            total: totals.total,
        }
    }
}

#[async_trait]
impl CartSyncGateway for InMemoryCartBackend {
    async fn sync(&self, request: SyncRequest) -> Result<AuthoritativeCart, CartError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.simulate_failure()?;

        {
            let mut lines = self.lines.lock();
            match request {
                SyncRequest::ReplaceItems { items } => {
                    *lines = items
                        .into_iter()
                        .filter(|line| line.quantity > 0)
                        .map(|line| (line.product_id, line.quantity))
                        .collect();
                }
                SyncRequest::RemoveItem { product_id } => {
                    lines.remove(&product_id);
                }
                SyncRequest::Clear => lines.clear(),
            }
        }

        Ok(self.priced_cart())
    }

    async fn fetch(&self) -> Result<AuthoritativeCart, CartError> {
        self.simulate_latency().await;
        self.simulate_failure()?;
        Ok(self.priced_cart())
    }
}

#[async_trait]
impl PromoValidator for InMemoryCartBackend {
    async fn validate(&self, code: &str, _subtotal: Money) -> Result<PromoDecision, CartError> {
        self.simulate_latency().await;
        let discount = self.promos.lock().get(&code.to_uppercase()).copied();
        Ok(match discount {
            Some(discount) => PromoDecision::Accepted { discount },
            None => PromoDecision::Rejected {
                reason: "unknown promo code".into(),
            },
        })
    }
}
