//! # Application Module
//!
//! Connection manager, status tracking and the invalidation router.

pub mod connection;
pub mod router;
mod status;

pub use connection::{ConnectionManager, SubscriptionHandle};
pub use router::InvalidationRouter;
