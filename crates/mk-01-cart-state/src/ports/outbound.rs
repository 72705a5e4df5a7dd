//! # Outbound Ports
//!
//! Traits for the backend endpoints and the key-value store.

use crate::domain::{AuthoritativeCart, CartError, PromoDecision, StorageError, SyncRequest};
use async_trait::async_trait;
use shared_types::Money;

/// Remote cart sync endpoint - outbound port.
#[async_trait]
pub trait CartSyncGateway: Send + Sync {
    /// Push a local mutation; returns the backend's priced cart.
    async fn sync(&self, request: SyncRequest) -> Result<AuthoritativeCart, CartError>;

    /// Fetch the backend's current cart.
    async fn fetch(&self) -> Result<AuthoritativeCart, CartError>;
}

/// Promo validation endpoint - outbound port.
#[async_trait]
pub trait PromoValidator: Send + Sync {
    /// Validate `code` against the current subtotal.
    ///
    /// A rejection is `Ok(PromoDecision::Rejected)`; `Err` is reserved for
    /// transport failures.
    async fn validate(&self, code: &str, subtotal: Money) -> Result<PromoDecision, CartError>;
}

/// Namespaced string key-value store - outbound port.
///
/// Production: `FileStorage` (one file per key)
/// Testing: `InMemoryStorage`
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
