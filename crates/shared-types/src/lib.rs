//! # Shared Types Crate
//!
//! Primitive types used by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and money are defined once.
//! - **Exact Money**: amounts are stored as integer minor units, so every
//!   computed value is already rounded to two decimal places.
//! - **One Backoff Curve**: cart sync retries and realtime reconnects share
//!   the same capped exponential policy.

pub mod backoff;
pub mod ids;
pub mod money;
pub mod realtime;

pub use backoff::BackoffPolicy;
pub use ids::{ActorId, ProductId, VendorId};
pub use money::Money;
pub use realtime::{
    ChangeKind, ChangeNotification, ConnectionStatus, QueryKey, ResourceKind, ResourceScope,
    ScopeOwner,
};
