//! # Marketplace Client Test Suite
//!
//! Cross-crate flows that no single crate can exercise alone.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs            # catalogue, fee schedule, wait helpers
//! └── scenarios/
//!     ├── cart_flows.rs      # totals, promo, restart, out-of-order sync
//!     ├── realtime_flows.rs  # push change → invalidation → refetch
//!     └── session_flows.rs   # full ClientSession lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mk-tests
//! cargo test -p mk-tests scenarios::cart_flows::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod scenarios;
