//! # Cart Entities
//!
//! The `Cart` aggregate root and its lines.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | No stored line has quantity ≤ 0 | every mutator removes a line whose resulting quantity is ≤ 0 |
//! | One line per product | `items` is keyed by `ProductId` |
//! | Totals match items | mutators return `true` and the caller runs `recompute` |
//! | `discount` and `promo_code` cleared together | `clear`, `clear_promo` |
//!
//! Mutators return whether anything changed, so the pipeline can skip the
//! remote phase and the persistence write for no-ops.

use crate::domain::totals::{compute_totals, vendor_summaries, CartTotals, FeeSchedule};
use crate::domain::value_objects::{
    AuthoritativeCart, PersistedCart, SyncLine, PERSISTED_CART_VERSION,
};
use serde::{Deserialize, Serialize};
use shared_types::{Money, ProductId, VendorId};
use std::collections::BTreeMap;

/// Catalogue data captured when a product is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductSnapshot {
    /// Minimal snapshot; the name defaults to the product id.
    pub fn new(id: impl Into<ProductId>, vendor_id: impl Into<VendorId>, price: Money) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            vendor_id: vendor_id.into(),
            price,
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    /// Always ≥ 1 while stored.
    pub quantity: u32,
    /// Unit price when the line was created, or as last priced by the backend.
    pub price_snapshot: Money,
    pub product: ProductSnapshot,
}

impl CartItem {
    /// New line with a fresh price snapshot.
    #[must_use]
    pub fn new(product: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            vendor_id: product.vendor_id.clone(),
            quantity,
            price_snapshot: product.price,
            product,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price_snapshot.times(self.quantity)
    }

    #[must_use]
    pub fn to_sync_line(&self) -> SyncLine {
        SyncLine {
            product_id: self.product_id.clone(),
            vendor_id: self.vendor_id.clone(),
            quantity: self.quantity,
        }
    }
}

/// Per-vendor slice of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub vendor_id: VendorId,
    pub item_count: u32,
    pub subtotal: Money,
}

impl VendorSummary {
    #[must_use]
    pub fn empty(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            item_count: 0,
            subtotal: Money::ZERO,
        }
    }
}

/// Cart aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<ProductId, CartItem>,
    promo_code: Option<String>,
    totals: CartTotals,
    vendors: Vec<VendorSummary>,
}

impl Cart {
    /// Empty cart with totals computed under `fees`.
    #[must_use]
    pub fn empty(fees: &FeeSchedule) -> Self {
        let mut cart = Self {
            items: BTreeMap::new(),
            promo_code: None,
            totals: CartTotals::default(),
            vendors: Vec::new(),
        };
        cart.recompute(fees);
        cart
    }

    /// Rebuild from the persisted subset. Totals are recomputed, never read.
    #[must_use]
    pub fn from_persisted(persisted: PersistedCart, fees: &FeeSchedule) -> Self {
        let mut cart = Self::empty(fees);
        for item in persisted.items.into_iter().filter(|item| item.quantity > 0) {
            cart.items.insert(item.product_id.clone(), item);
        }
        cart.promo_code = persisted.promo_code.filter(|code| !code.is_empty());
        cart.recompute(fees);
        cart
    }

    /// Extract the persisted subset.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedCart {
        PersistedCart {
            version: PERSISTED_CART_VERSION,
            items: self.items.values().cloned().collect(),
            promo_code: self.promo_code.clone(),
        }
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Add `quantity` of `product`.
    ///
    /// A positive quantity increments an existing line or inserts a new one.
    /// `quantity <= 0` follows the `update_quantity` rule: a present line is
    /// removed, an absent one is left alone.
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(&product.id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.get_mut(&product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => {
                self.items
                    .insert(product.id.clone(), CartItem::new(product, quantity));
            }
        }
        true
    }

    /// Remove a line. Absent ids are a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        self.items.remove(product_id).is_some()
    }

    /// Replace a line's quantity; ≤ 0 removes it.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.get_mut(product_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Drop every line, the discount and the promo code.
    pub fn clear(&mut self) -> bool {
        let changed =
            !self.items.is_empty() || self.promo_code.is_some() || !self.totals.discount.is_zero();
        self.items.clear();
        self.clear_promo();
        changed
    }

    /// Commit an accepted promo code with its discount.
    pub fn set_promo(&mut self, code: impl Into<String>, discount: Money) {
        self.promo_code = Some(code.into());
        self.totals.discount = discount;
    }

    /// Keep the code but forget the discount (hydrated, not yet revalidated).
    pub fn set_unvalidated_promo(&mut self, code: Option<String>) {
        self.promo_code = code;
        self.totals.discount = Money::ZERO;
    }

    /// Clear promo code and discount together.
    pub fn clear_promo(&mut self) -> bool {
        let changed = self.promo_code.is_some() || !self.totals.discount.is_zero();
        self.promo_code = None;
        self.totals.discount = Money::ZERO;
        changed
    }

    /// Recompute every derived field under `fees`.
    pub fn recompute(&mut self, fees: &FeeSchedule) {
        self.totals = compute_totals(&self.items, self.totals.discount, fees);
        self.vendors = vendor_summaries(&self.items);
    }

    /// Overwrite derived fields with the backend's authoritative values.
    ///
    /// Line prices are always refreshed. The line set itself is only replaced
    /// when `adopt_items` is set; a sync response must not drop a local edit
    /// whose own sync has not landed yet.
    pub fn apply_authoritative(&mut self, remote: &AuthoritativeCart, adopt_items: bool) {
        if adopt_items {
            let mut adopted = BTreeMap::new();
            for line in remote.items.iter().filter(|line| line.quantity > 0) {
                let product = self
                    .items
                    .get(&line.product_id)
                    .map(|item| item.product.clone())
                    .unwrap_or_else(|| {
                        ProductSnapshot::new(
                            line.product_id.clone(),
                            line.vendor_id.clone(),
                            line.unit_price,
                        )
                    });
                let mut item = CartItem::new(product, line.quantity);
                item.price_snapshot = line.unit_price;
                adopted.insert(line.product_id.clone(), item);
            }
            self.items = adopted;
        } else {
            for line in &remote.items {
                if let Some(item) = self.items.get_mut(&line.product_id) {
                    item.price_snapshot = line.unit_price;
                }
            }
        }

        self.vendors = remote.vendors.clone();
        self.totals.subtotal = remote.subtotal;
        self.totals.delivery_fee = remote.delivery_fee;
        self.totals.service_fee = remote.service_fee;
        self.totals.total = (remote.total - self.totals.discount).non_negative();
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Σ quantity over lines. Never stored.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .values()
            .fold(0u32, |sum, item| sum.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.get(product_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn sync_lines(&self) -> Vec<SyncLine> {
        self.items.values().map(CartItem::to_sync_line).collect()
    }

    #[must_use]
    pub fn promo_code(&self) -> Option<&str> {
        self.promo_code.as_deref()
    }

    #[must_use]
    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    #[must_use]
    pub fn vendor_groups(&self) -> &[VendorSummary] {
        &self.vendors
    }
}
