//! # Inbound Ports
//!
//! API trait defining what the cart engine offers its callers.

use crate::domain::{Cart, CartError, ProductSnapshot};
use async_trait::async_trait;
use shared_types::{Money, ProductId};

/// Cart API - inbound port.
///
/// Every mutator except promo application is optimistic: it returns the
/// post-mutation cart immediately and reconciles with the backend on a
/// detached task.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Add `quantity` of `product`. See [`Cart::add_item`] for the quantity policy.
    fn add_item(&self, product: ProductSnapshot, quantity: i64) -> Cart;

    /// Remove a line. Absent ids are a no-op.
    fn remove_item(&self, product_id: &ProductId) -> Cart;

    /// Replace a line's quantity; ≤ 0 behaves as `remove_item`.
    fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Cart;

    /// Empty items, discount and promo code.
    fn clear(&self) -> Cart;

    /// Validate `code` remotely and commit its discount on acceptance.
    ///
    /// The cart is unchanged on any error. A cart mutation, a promo clear or
    /// a newer `apply_promo_code` call made while validation is in flight
    /// wins, and this call fails with [`CartError::PromoSuperseded`].
    async fn apply_promo_code(&self, code: &str) -> Result<Money, CartError>;

    /// Drop the promo code and its discount.
    fn clear_promo_code(&self) -> Cart;

    /// Σ quantity over all lines.
    fn item_count(&self) -> u32;

    /// Current cart.
    fn snapshot(&self) -> Cart;

    /// True while the newest local mutation is unacknowledged by the backend.
    fn has_pending_sync(&self) -> bool;
}
