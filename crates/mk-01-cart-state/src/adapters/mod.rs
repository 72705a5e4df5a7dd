//! # Adapters
//!
//! Implementations of the outbound ports.
//!
//! - `storage`: in-memory and file-backed `KeyValueStorage`
//! - `backend`: in-process cart/promo backend for tests and the demo binary

pub mod backend;
pub mod storage;

pub use backend::InMemoryCartBackend;
pub use storage::{FileStorage, InMemoryStorage};
