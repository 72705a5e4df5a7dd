//! Shared fixtures for the integration scenarios.

use std::sync::Arc;
use std::time::Duration;

use mk_01_cart_state::{
    CartConfig, CartStore, FeeSchedule, InMemoryCartBackend, InMemoryStorage, KeyValueStorage,
    ProductSnapshot,
};
use shared_types::Money;

/// Flat vendor fee 2.99, service fee 0.50.
pub fn fees() -> FeeSchedule {
    FeeSchedule {
        flat_vendor_fee: Money::from_cents(299),
        service_fee: Money::from_cents(50),
    }
}

/// Product A from vendor V1 at 10.00.
pub fn product_a() -> ProductSnapshot {
    ProductSnapshot::new("A", "V1", Money::from_cents(1000)).with_name("Product A")
}

/// Product B from vendor V2 at 15.00.
pub fn product_b() -> ProductSnapshot {
    ProductSnapshot::new("B", "V2", Money::from_cents(1500)).with_name("Product B")
}

/// Backend pricing A and B and accepting `SAVE5` for 5.00.
pub fn backend() -> Arc<InMemoryCartBackend> {
    Arc::new(
        InMemoryCartBackend::new(fees())
            .with_product(product_a())
            .with_product(product_b())
            .with_promo("SAVE5", Money::from_cents(500)),
    )
}

pub fn cart_config() -> CartConfig {
    CartConfig {
        fees: fees(),
        ..CartConfig::for_testing()
    }
}

/// A store over `backend` persisting into `storage`.
pub fn cart_store(
    backend: &Arc<InMemoryCartBackend>,
    storage: Arc<dyn KeyValueStorage>,
) -> CartStore {
    CartStore::new(cart_config(), backend.clone(), backend.clone(), storage)
}

pub fn memory_storage() -> Arc<InMemoryStorage> {
    Arc::new(InMemoryStorage::new())
}

/// Let detached tasks (sync retries, pumps, router) run to completion.
/// Meant for paused-clock tests, where the sleep auto-advances.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(60)).await;
}
