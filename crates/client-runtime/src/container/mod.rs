//! # Session Container
//!
//! Owns one instance of every engine for a signed-in client and the event bus
//! connecting them.
//!
//! - `config` - `ClientConfig` with environment overrides
//! - `session` - `ClientSession`, construction and lifecycle

pub mod config;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use session::{ClientSession, SessionPorts};
