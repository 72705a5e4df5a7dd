//! # Totals Engine
//!
//! Derived money fields are a pure function of the item set, the discount
//! and the fee schedule active at the time of computation.
//!
//! | Field | Rule |
//! |-------|------|
//! | subtotal | Σ price_snapshot × quantity |
//! | delivery_fee | flat_vendor_fee × distinct vendors |
//! | total | max(0, subtotal + delivery_fee + service_fee − discount) |

use crate::domain::entities::{CartItem, VendorSummary};
use serde::{Deserialize, Serialize};
use shared_types::{Money, ProductId, VendorId};
use std::collections::{BTreeMap, BTreeSet};

/// Default delivery fee per distinct vendor.
pub const DEFAULT_FLAT_VENDOR_FEE: Money = Money::from_cents(299);

/// Default fixed service fee.
pub const DEFAULT_SERVICE_FEE: Money = Money::from_cents(50);

/// Fees applied on top of the item subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Charged once per distinct vendor in the cart.
    pub flat_vendor_fee: Money,
    /// Charged once per cart.
    pub service_fee: Money,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            flat_vendor_fee: DEFAULT_FLAT_VENDOR_FEE,
            service_fee: DEFAULT_SERVICE_FEE,
        }
    }
}

/// Derived money fields of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub service_fee: Money,
    pub discount: Money,
    pub total: Money,
}

/// Compute every derived money field.
#[must_use]
pub fn compute_totals(
    items: &BTreeMap<ProductId, CartItem>,
    discount: Money,
    fees: &FeeSchedule,
) -> CartTotals {
    let subtotal: Money = items.values().map(CartItem::line_total).sum();
    let vendors: BTreeSet<&VendorId> = items.values().map(|item| &item.vendor_id).collect();
    let delivery_fee = fees
        .flat_vendor_fee
        .times(u32::try_from(vendors.len()).unwrap_or(u32::MAX));
    let total = (subtotal + delivery_fee + fees.service_fee - discount).non_negative();

    CartTotals {
        subtotal,
        delivery_fee,
        service_fee: fees.service_fee,
        discount,
        total,
    }
}

/// Group items by vendor, ordered by vendor id.
#[must_use]
pub fn vendor_summaries(items: &BTreeMap<ProductId, CartItem>) -> Vec<VendorSummary> {
    let mut groups: BTreeMap<&VendorId, VendorSummary> = BTreeMap::new();
    for item in items.values() {
        let group = groups
            .entry(&item.vendor_id)
            .or_insert_with(|| VendorSummary::empty(item.vendor_id.clone()));
        group.item_count = group.item_count.saturating_add(item.quantity);
        group.subtotal += item.line_total();
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ProductSnapshot;

    fn items(lines: &[(&str, &str, i64, u32)]) -> BTreeMap<ProductId, CartItem> {
        lines
            .iter()
            .map(|(id, vendor, cents, qty)| {
                let product = ProductSnapshot::new(*id, *vendor, Money::from_cents(*cents));
                (ProductId::from(*id), CartItem::new(product, *qty))
            })
            .collect()
    }

    #[test]
    fn test_empty_cart_carries_service_fee_only() {
        let totals = compute_totals(&BTreeMap::new(), Money::ZERO, &FeeSchedule::default());
        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.delivery_fee, Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(50));
    }

    #[test]
    fn test_delivery_fee_per_distinct_vendor() {
        let cart = items(&[("A", "V1", 1000, 2), ("B", "V2", 1500, 1), ("C", "V1", 100, 1)]);
        let totals = compute_totals(&cart, Money::ZERO, &FeeSchedule::default());
        assert_eq!(totals.subtotal, Money::from_cents(3600));
        assert_eq!(totals.delivery_fee, Money::from_cents(598));
        assert_eq!(totals.total, Money::from_cents(3600 + 598 + 50));
    }

    #[test]
    fn test_discount_never_drives_total_negative() {
        let cart = items(&[("A", "V1", 100, 1)]);
        let totals = compute_totals(&cart, Money::from_cents(10_000), &FeeSchedule::default());
        assert_eq!(totals.total, Money::ZERO);
        assert_eq!(totals.discount, Money::from_cents(10_000));
    }

    #[test]
    fn test_vendor_summaries_group_items() {
        let cart = items(&[("A", "V1", 1000, 2), ("B", "V2", 1500, 1), ("C", "V1", 100, 3)]);
        let groups = vendor_summaries(&cart);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].vendor_id, VendorId::from("V1"));
        assert_eq!(groups[0].item_count, 5);
        assert_eq!(groups[0].subtotal, Money::from_cents(2300));
        assert_eq!(groups[1].subtotal, Money::from_cents(1500));
    }
}
