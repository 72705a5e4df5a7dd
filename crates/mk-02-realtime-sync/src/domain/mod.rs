//! # Domain Layer - Realtime Sync
//!
//! - `signals`: what a push channel emits
//! - `rules`: which cached queries a resource change invalidates
//! - `badges`: unread counters fed only by authoritative refetches
//! - `errors`: `RealtimeError`

pub mod badges;
pub mod errors;
pub mod rules;
pub mod signals;

pub use badges::*;
pub use errors::*;
pub use rules::*;
pub use signals::*;

pub use shared_types::{
    ActorId, ChangeKind, ChangeNotification, ConnectionStatus, QueryKey, ResourceKind,
    ResourceScope, ScopeOwner,
};
