//! # MK-02 Realtime Sync
//!
//! Push-driven cache invalidation. Push events never carry state into the
//! caches; they only say "resource R changed", and the affected read queries
//! are refetched.
//!
//! ## Flow
//!
//! ```text
//! PushChannel ──signals──→ ConnectionManager ──MarketEvent──→ Event Bus
//!                               │                                 │
//!                        ConnectionStatus                ResourceChanged
//!                        (watch + bus)                            ↓
//!                                                     InvalidationRouter
//!                                                          │ mark_stale
//!                                                          ↓ schedule_refetch
//!                                                      QueryCache
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | One handle per scope | Re-subscribing an open scope is a no-op |
//! | RAII teardown | Dropping a handle aborts its pump and closes the channel |
//! | Bounded reconnect | Consecutive reconnects stop after `max_attempts` |
//! | One refetch in flight | Duplicate invalidations before completion schedule nothing |
//! | Authoritative badges | Counters change only from refetched counts |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! ```text
//! mk-02-realtime-sync/
//! ├── domain/        # signals, invalidation rules, badge counters, errors
//! ├── ports/         # RealtimeApi (inbound), PushChannel/QueryCache (outbound)
//! ├── application/   # ConnectionManager, status tracker, InvalidationRouter
//! ├── adapters/      # in-memory push channel and query cache
//! └── config.rs      # RealtimeConfig
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{CacheEntryState, InMemoryPushChannel, InMemoryQueryCache};
pub use application::{ConnectionManager, InvalidationRouter, SubscriptionHandle};
pub use config::RealtimeConfig;
pub use domain::{
    BadgeCounters, ChannelSignal, InvalidationRule, InvalidationRules, RealtimeError, RuleTarget,
    TargetScope,
};
pub use ports::{PushChannel, QueryCache, RealtimeApi};
