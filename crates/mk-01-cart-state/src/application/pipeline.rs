//! # Remote Phase
//!
//! Detached sync of one local mutation, with retries, followed by
//! sequence-checked reconciliation.

use crate::application::persistence;
use crate::application::service::CartInner;
use crate::domain::{AuthoritativeCart, SyncRequest};
use shared_bus::MarketEvent;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

/// Start the remote phase for mutation `seq` on a detached task.
pub(crate) fn dispatch_sync(inner: &Arc<CartInner>, seq: u64, request: SyncRequest) {
    let Ok(handle) = Handle::try_current() else {
        warn!(seq, op = request.op(), "No async runtime; cart sync skipped");
        return;
    };
    let inner = Arc::clone(inner);
    handle.spawn(async move { run_sync(inner, seq, request).await });
}

async fn run_sync(inner: Arc<CartInner>, seq: u64, request: SyncRequest) {
    let policy = inner.config.sync_retry;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match inner.gateway.sync(request.clone()).await {
            Ok(remote) => {
                reconcile(&inner, seq, &remote).await;
                return;
            }
            Err(err) if err.is_transient() && policy.allows_another(attempts) => {
                let delay = policy.next_delay(attempts);
                warn!(
                    seq,
                    op = request.op(),
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Cart sync failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                error!(
                    seq,
                    op = request.op(),
                    attempts,
                    error = %err,
                    "Cart sync abandoned; optimistic state retained"
                );
                inner
                    .publish(MarketEvent::CartSyncFailed {
                        seq,
                        attempts,
                        error: err.to_string(),
                    })
                    .await;
                return;
            }
        }
    }
}

/// Apply `remote` if `seq` is not older than the last applied response.
async fn reconcile(inner: &Arc<CartInner>, seq: u64, remote: &AuthoritativeCart) {
    let outcome = {
        let mut state = inner.state.lock();
        if state.sequence.should_apply(seq) {
            state.cart.apply_authoritative(remote, false);
            state.sequence.mark_applied(seq);
            Ok(())
        } else {
            Err(state.sequence.last_applied())
        }
    };

    match outcome {
        Ok(()) => {
            debug!(seq, total = %remote.total, "Authoritative cart applied");
            persistence::schedule_flush(inner);
            inner.publish(MarketEvent::CartSynced { seq }).await;
        }
        Err(last_applied) => {
            debug!(seq, last_applied, "Stale cart sync response discarded");
            inner
                .publish(MarketEvent::CartSyncDiscarded { seq, last_applied })
                .await;
        }
    }
}
