//! # Client Configuration
//!
//! Unified configuration for the cart engine, the realtime layer and logging.
//!
//! ## Environment Overrides
//!
//! | Variable | Applies to |
//! |----------|------------|
//! | `MK_FLAT_VENDOR_FEE` | `cart.fees.flat_vendor_fee` (major units, e.g. `2.99`) |
//! | `MK_SERVICE_FEE` | `cart.fees.service_fee` (major units) |
//! | `MK_STORAGE_DIR` | `storage_dir` (file-backed persistence when set) |
//! | `MK_FLUSH_INTERVAL_MS` | `cart.flush_interval_ms` |
//! | `MK_SYNC_MAX_ATTEMPTS` | `cart.sync_retry.max_attempts` |
//! | `MK_RECONNECT_MAX_ATTEMPTS` | `realtime.reconnect.max_attempts` |
//!
//! Logging variables are read by [`TelemetryConfig::from_env`].

use mk_01_cart_state::CartConfig;
use mk_02_realtime_sync::RealtimeConfig;
use mk_telemetry::TelemetryConfig;
use shared_types::{BackoffPolicy, Money};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment override did not parse.
    #[error("{var}: cannot parse '{value}'")]
    InvalidValue { var: &'static str, value: String },

    /// A fee is negative.
    #[error("{field} must not be negative (got {value})")]
    NegativeFee { field: &'static str, value: Money },

    /// A backoff schedule cannot run.
    #[error("{policy}: {reason}")]
    InvalidBackoff {
        policy: &'static str,
        reason: &'static str,
    },

    /// Push channels need room for at least one signal.
    #[error("realtime.channel_buffer must be at least 1")]
    ZeroChannelBuffer,

    /// Storage namespace is empty.
    #[error("cart.storage_namespace must not be empty")]
    EmptyNamespace,
}

/// Complete client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Cart engine configuration.
    pub cart: CartConfig,
    /// Realtime layer configuration.
    pub realtime: RealtimeConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// Directory for file-backed persistence. `None` keeps the cart in memory.
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Fast, deterministic settings for tests.
    pub fn for_testing() -> Self {
        Self {
            cart: CartConfig::for_testing(),
            realtime: RealtimeConfig::for_testing(),
            telemetry: TelemetryConfig::default(),
            storage_dir: None,
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides read from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(fee) = parse::<f64>(&lookup, "MK_FLAT_VENDOR_FEE")? {
            config.cart.fees.flat_vendor_fee = Money::from_major(fee);
        }
        if let Some(fee) = parse::<f64>(&lookup, "MK_SERVICE_FEE")? {
            config.cart.fees.service_fee = Money::from_major(fee);
        }
        if let Some(interval) = parse::<u64>(&lookup, "MK_FLUSH_INTERVAL_MS")? {
            config.cart.flush_interval_ms = interval;
        }
        if let Some(attempts) = parse::<u32>(&lookup, "MK_SYNC_MAX_ATTEMPTS")? {
            config.cart.sync_retry.max_attempts = attempts;
        }
        if let Some(attempts) = parse::<u32>(&lookup, "MK_RECONNECT_MAX_ATTEMPTS")? {
            config.realtime.reconnect.max_attempts = attempts;
        }
        config.storage_dir = lookup("MK_STORAGE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Reject settings the engines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fees = &self.cart.fees;
        if fees.flat_vendor_fee.cents() < 0 {
            return Err(ConfigError::NegativeFee {
                field: "cart.fees.flat_vendor_fee",
                value: fees.flat_vendor_fee,
            });
        }
        if fees.service_fee.cents() < 0 {
            return Err(ConfigError::NegativeFee {
                field: "cart.fees.service_fee",
                value: fees.service_fee,
            });
        }
        if self.cart.storage_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        // Zero sync attempts would never send anything; zero reconnects is allowed.
        if self.cart.sync_retry.max_attempts == 0 {
            return Err(ConfigError::InvalidBackoff {
                policy: "cart.sync_retry",
                reason: "max_attempts must be at least 1",
            });
        }
        check_delays("cart.sync_retry", &self.cart.sync_retry)?;
        check_delays("realtime.reconnect", &self.realtime.reconnect)?;
        if self.realtime.channel_buffer == 0 {
            return Err(ConfigError::ZeroChannelBuffer);
        }
        Ok(())
    }
}

fn check_delays(policy: &'static str, backoff: &BackoffPolicy) -> Result<(), ConfigError> {
    if backoff.base_delay_ms > backoff.max_delay_ms {
        return Err(ConfigError::InvalidBackoff {
            policy,
            reason: "base_delay_ms exceeds max_delay_ms",
        });
    }
    Ok(())
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}
