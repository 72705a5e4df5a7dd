//! # Marketplace Client Runtime
//!
//! Wires the client-side engines for one signed-in user.
//!
//! ## Event Flow
//!
//! ```text
//! CartStore ──CartSynced / CartSyncDiscarded / CartSyncFailed──┐
//!                                                              ↓
//! ConnectionManager ──ConnectionStatusChanged───────────→ Event Bus
//!        │            ──ResourceChanged─────────────────→     │
//!        │                                                    ↓
//!   PushChannel                                    InvalidationRouter
//!                                                   │ mark_stale
//!                                                   ↓ schedule_refetch
//!                                               QueryCache ──refetch──→ BadgeCounters
//! ```
//!
//! ## Modular Structure
//!
//! - `container/` - `ClientConfig` and the `ClientSession` container

pub mod container;

pub use container::{ClientConfig, ClientSession, ConfigError, SessionPorts};
