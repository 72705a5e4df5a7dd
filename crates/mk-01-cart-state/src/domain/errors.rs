//! # Domain Errors
//!
//! Error types for the cart state engine.
//!
//! Only promo application surfaces errors to the mutating caller. Sync and
//! persistence failures are absorbed by the pipeline and logged.

use thiserror::Error;

/// Cart operation errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// Promo code was empty after trimming.
    #[error("Promo code is empty")]
    EmptyPromoCode,

    /// The promo endpoint rejected the code.
    #[error("Promo code '{code}' rejected: {reason}")]
    PromoRejected {
        /// Code as submitted.
        code: String,
        /// Reason returned by the backend.
        reason: String,
    },

    /// The cart changed while the code was being validated, so the
    /// validated discount no longer applies. Nothing was committed.
    #[error("Promo code '{code}' superseded by a cart change during validation")]
    PromoSuperseded {
        /// Code as submitted.
        code: String,
    },

    /// No promo code is held, so there is nothing to revalidate.
    #[error("No promo code applied")]
    NoPromoCode,

    /// Remote endpoint failure (network, server error, malformed response).
    #[error("Remote call failed: {0}")]
    Remote(String),

    /// Key-value storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Persisted blob could not be encoded or decoded.
    #[error("Cart encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl CartError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Storage(StorageError::Unavailable(_)))
    }
}

/// Key-value storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Filesystem or device error.
    #[error("Storage I/O error: {message}")]
    Io {
        /// Underlying error message.
        message: String,
    },

    /// Backend not available (quota, permissions, simulated outage).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
