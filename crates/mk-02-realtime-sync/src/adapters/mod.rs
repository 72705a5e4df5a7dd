//! # Adapters
//!
//! In-process implementations of the push transport and the query cache.

pub mod cache;
pub mod push;

pub use cache::{CacheEntryState, InMemoryQueryCache};
pub use push::InMemoryPushChannel;
