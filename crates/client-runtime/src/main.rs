//! # Marketplace Client Runtime
//!
//! Drives a scripted session against the in-memory adapters: fills a cart,
//! applies a promo code, opens push channels and routes a change through
//! cache invalidation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use client_runtime::{ClientConfig, ClientSession, SessionPorts};
use mk_01_cart_state::{CartApi, InMemoryCartBackend, ProductSnapshot};
use mk_02_realtime_sync::{ChannelSignal, InMemoryPushChannel, InMemoryQueryCache, RealtimeApi};
use mk_telemetry::init_tracing;
use shared_types::{ActorId, ChangeKind, Money, QueryKey, ResourceKind, ResourceScope};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.telemetry).context("Failed to initialize tracing")?;

    let backend = Arc::new(
        InMemoryCartBackend::new(config.cart.fees)
            .with_product(
                ProductSnapshot::new("A", "V1", Money::from_cents(1000)).with_name("Tomatoes"),
            )
            .with_product(
                ProductSnapshot::new("B", "V2", Money::from_cents(1500)).with_name("Olive oil"),
            )
            .with_promo("SAVE5", Money::from_cents(500)),
    );
    let push = Arc::new(InMemoryPushChannel::new(config.realtime.channel_buffer));
    let cache = Arc::new(InMemoryQueryCache::new());

    let session = ClientSession::start(
        config,
        SessionPorts {
            cart_gateway: backend.clone(),
            promo_validator: backend.clone(),
            push_channel: push.clone(),
            query_cache: cache.clone(),
        },
    )
    .await
    .context("Failed to start client session")?;

    // Cart
    let cart = session.cart();
    cart.add_item(ProductSnapshot::new("A", "V1", Money::from_cents(1000)), 2);
    cart.add_item(ProductSnapshot::new("B", "V2", Money::from_cents(1500)), 1);
    let discount = cart
        .apply_promo_code("SAVE5")
        .await
        .context("Promo code rejected")?;
    let totals = *cart.snapshot().totals();
    info!(
        items = cart.item_count(),
        subtotal = %totals.subtotal,
        delivery = %totals.delivery_fee,
        service = %totals.service_fee,
        discount = %discount,
        total = %totals.total,
        "Cart ready"
    );

    // Realtime
    let orders = ResourceScope::vendor(ResourceKind::Orders, "V1");
    let orders_key = QueryKey::scoped("orders", "V1");
    cache.insert_fresh(orders_key.clone());
    session
        .sign_in(ActorId::from("vendor-1"), vec![orders.clone()])
        .await
        .context("Failed to open push channels")?;
    info!(status = %session.realtime().status(), "Realtime connected");

    push.emit(
        &orders,
        ChannelSignal::Change {
            resource: ResourceKind::Orders,
            resource_id: "order-42".into(),
            kind: ChangeKind::Update,
        },
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    info!(
        stale = cache.is_stale(&orders_key),
        pending = session.router().pending_refetches(),
        "Order list invalidated"
    );

    cache.complete_refetch(&orders_key);
    session.refetch_completed(&orders_key, None);

    session.shutdown().await.context("Failed to persist cart")?;
    Ok(())
}
