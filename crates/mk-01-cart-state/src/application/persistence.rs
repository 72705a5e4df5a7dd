//! # Throttled Persistence
//!
//! Mutations mark the cart dirty; one delayed flush writes whatever the cart
//! looks like when the window closes. A burst of N mutations inside one
//! window produces a single write of the latest snapshot.
//!
//! Failures are logged and never reach the mutating caller.

use crate::application::service::CartInner;
use crate::domain::CartError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{trace, warn};

/// Write the persisted subset now.
pub(crate) fn flush(inner: &CartInner) -> Result<(), CartError> {
    let persisted = inner.state.lock().cart.to_persisted();
    let blob = serde_json::to_string(&persisted)?;
    inner
        .storage
        .set(&inner.config.storage_key(), &blob)
        .map_err(CartError::from)?;
    trace!(items = persisted.items.len(), "Cart persisted");
    Ok(())
}

fn flush_logged(inner: &CartInner) {
    if let Err(err) = flush(inner) {
        warn!(error = %err, "Cart persistence failed; in-memory state retained");
    }
}

/// Schedule a write of the latest snapshot.
pub(crate) fn schedule_flush(inner: &Arc<CartInner>) {
    let interval = inner.config.flush_interval();
    if interval.is_zero() {
        flush_logged(inner);
        return;
    }

    if inner.flush_pending.swap(true, Ordering::AcqRel) {
        return;
    }

    let Ok(handle) = Handle::try_current() else {
        inner.flush_pending.store(false, Ordering::Release);
        flush_logged(inner);
        return;
    };

    let inner = Arc::clone(inner);
    handle.spawn(async move {
        tokio::time::sleep(interval).await;
        // Clear before snapshotting so a mutation racing this flush schedules
        // its own write.
        inner.flush_pending.store(false, Ordering::Release);
        flush_logged(&inner);
    });
}
