//! Storage Adapters
//!
//! Implementations of the `KeyValueStorage` trait.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::InMemoryStorage;
