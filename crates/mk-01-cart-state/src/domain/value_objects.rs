//! # Value Objects
//!
//! Wire shapes exchanged with the remote cart endpoint, the promo endpoint
//! and the key-value store.

use crate::domain::entities::{CartItem, VendorSummary};
use serde::{Deserialize, Serialize};
use shared_types::{Money, ProductId, VendorId};

/// One cart line as sent to the backend. Prices are never sent; the backend
/// prices lines from its own catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLine {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub quantity: u32,
}

/// Remote phase payload of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncRequest {
    /// Full item list, sent after adds and quantity changes.
    ReplaceItems { items: Vec<SyncLine> },
    /// Single removed product.
    RemoveItem { product_id: ProductId },
    /// Everything removed.
    Clear,
}

impl SyncRequest {
    /// Short operation name for logs.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::ReplaceItems { .. } => "replace_items",
            Self::RemoveItem { .. } => "remove_item",
            Self::Clear => "clear",
        }
    }
}

/// A line as priced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Authoritative cart returned by the sync and fetch endpoints.
///
/// `total` is computed by the backend without any promo discount; the
/// discount is a client-side commitment applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativeCart {
    pub items: Vec<PricedLine>,
    pub vendors: Vec<VendorSummary>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub service_fee: Money,
    pub total: Money,
}

/// Outcome of promo validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromoDecision {
    Accepted { discount: Money },
    Rejected { reason: String },
}

/// Current persisted layout version.
pub const PERSISTED_CART_VERSION: u32 = 1;

/// The persisted subset of a cart: items and promo code only.
///
/// Money totals are deliberately absent so that a fee-schedule change
/// between sessions is picked up on the next hydration without migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    pub version: u32,
    pub items: Vec<CartItem>,
    pub promo_code: Option<String>,
}
