//! # MK-01 Cart State
//!
//! Client-side cart engine: an optimistic, locally authoritative cart
//! replica reconciled against the backend, with a deliberately partial
//! persisted subset.
//!
//! ## Mutation Flow
//!
//! ```text
//! add_item / remove_item / update_quantity / clear
//!        │
//!        ├─ local phase  (sync)   aggregate mutated, totals recomputed
//!        ├─ persistence  (throttled) {items, promo_code} written
//!        └─ remote phase (detached) sync → retry → apply if seq ≥ last_applied
//!
//! apply_promo_code  (awaited end to end; commits only on acceptance)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Positive quantities | A line whose quantity would be ≤ 0 is absent |
//! | Derived totals | `total = max(0, subtotal + delivery + service − discount)` |
//! | Per-vendor delivery | `delivery_fee = flat_vendor_fee × distinct vendors` |
//! | Partial persistence | Only `{items, promo_code}` is stored; totals are recomputed |
//! | Ordered reconciliation | Responses older than the last applied one are dropped |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! ```text
//! mk-01-cart-state/
//! ├── domain/        # Cart aggregate, totals, sequence, wire shapes, errors
//! ├── ports/         # CartApi (inbound), gateway/promo/storage (outbound)
//! ├── application/   # CartStore, remote phase, throttled persistence
//! ├── adapters/      # memory + file storage, in-process backend
//! └── config.rs      # CartConfig
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{FileStorage, InMemoryCartBackend, InMemoryStorage};
pub use application::{CartStore, HydrationOutcome, SyncStatus};
pub use config::CartConfig;
pub use domain::{
    AuthoritativeCart, Cart, CartError, CartItem, CartTotals, FeeSchedule, PersistedCart,
    PricedLine, ProductSnapshot, PromoDecision, StorageError, SyncLine, SyncRequest,
    SyncSequence, VendorSummary, DEFAULT_FLAT_VENDOR_FEE, DEFAULT_SERVICE_FEE,
    PERSISTED_CART_VERSION,
};
pub use ports::{CartApi, CartSyncGateway, KeyValueStorage, PromoValidator};
