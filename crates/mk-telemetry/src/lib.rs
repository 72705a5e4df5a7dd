//! # MK Telemetry
//!
//! Structured logging setup shared by every binary in the workspace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mk_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_tracing(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MK_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `MK_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `MK_SERVICE_NAME` | `marketplace-client` | Service name attached to startup log |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}
