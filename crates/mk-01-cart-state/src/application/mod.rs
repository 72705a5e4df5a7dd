//! # Application Module
//!
//! `CartStore` and the machinery behind its two-phase mutations.

mod persistence;
mod pipeline;
pub mod service;

pub use service::{CartStore, HydrationOutcome, SyncStatus};
