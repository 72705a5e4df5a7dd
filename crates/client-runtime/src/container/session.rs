//! # Client Session
//!
//! One container per running client. Every engine is an explicit instance
//! built here from injected ports; nothing is global.
//!
//! ## Startup Order
//!
//! 1. Validate configuration
//! 2. Create the event bus
//! 3. Build the cart store, restore the persisted cart, re-validate its promo
//! 4. Build the connection manager
//! 5. Build the invalidation router and start following the bus
//!
//! ## Thread Safety
//!
//! - Engines are cheap handles over `Arc` state and can be cloned out
//! - Engines talk to each other only through the event bus

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use mk_01_cart_state::{
    CartError, CartStore, CartSyncGateway, FileStorage, HydrationOutcome, InMemoryStorage,
    KeyValueStorage, PromoValidator,
};
use mk_02_realtime_sync::{
    BadgeCounters, ConnectionManager, InvalidationRouter, InvalidationRules, PushChannel,
    QueryCache, RealtimeApi, RealtimeError,
};
use shared_bus::InMemoryEventBus;
use shared_types::{ActorId, QueryKey, ResourceScope};

use crate::container::config::{ClientConfig, ConfigError};

/// Backend-facing ports a session is built on.
#[derive(Clone)]
pub struct SessionPorts {
    /// Remote cart sync endpoint.
    pub cart_gateway: Arc<dyn CartSyncGateway>,
    /// Promo validation endpoint.
    pub promo_validator: Arc<dyn PromoValidator>,
    /// Push channel provider.
    pub push_channel: Arc<dyn PushChannel>,
    /// Cached read-query layer.
    pub query_cache: Arc<dyn QueryCache>,
}

/// Central container holding the engines of one client.
pub struct ClientSession {
    config: ClientConfig,
    bus: Arc<InMemoryEventBus>,
    cart: CartStore,
    hydration: HydrationOutcome,
    realtime: ConnectionManager,
    router: InvalidationRouter,
    router_task: JoinHandle<()>,
    badges: BadgeCounters,
}

impl ClientSession {
    /// Build every engine and restore persisted state.
    pub async fn start(config: ClientConfig, ports: SessionPorts) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            storage = ?config.storage_dir,
            namespace = %config.cart.storage_namespace,
            "Starting client session"
        );

        let bus = Arc::new(InMemoryEventBus::new());

        let storage: Arc<dyn KeyValueStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(InMemoryStorage::new()),
        };
        let cart = CartStore::new(
            config.cart.clone(),
            ports.cart_gateway,
            ports.promo_validator,
            storage,
        )
        .with_events(bus.clone());

        let hydration = cart.hydrate();
        info!(outcome = ?hydration, "Cart hydrated");
        if let HydrationOutcome::Restored {
            promo_code: Some(code),
            ..
        } = &hydration
        {
            match cart.revalidate_promo().await {
                Ok(discount) => info!(code = %code, discount = %discount, "Promo code restored"),
                Err(CartError::PromoRejected { reason, .. }) => {
                    info!(code = %code, reason = %reason, "Persisted promo code dropped")
                }
                Err(err) => warn!(code = %code, error = %err, "Promo re-validation failed"),
            }
        }

        let realtime =
            ConnectionManager::new(config.realtime.clone(), ports.push_channel, bus.clone());

        let router = InvalidationRouter::new(
            InvalidationRules::default(),
            ports.query_cache,
            bus.clone(),
        );
        let router_task = router.spawn(bus.as_ref());

        info!("Client session ready");
        Ok(Self {
            config,
            bus,
            cart,
            hydration,
            realtime,
            router,
            router_task,
            badges: BadgeCounters::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The bus every engine publishes on.
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// What startup found in storage.
    pub fn hydration(&self) -> &HydrationOutcome {
        &self.hydration
    }

    pub fn realtime(&self) -> &ConnectionManager {
        &self.realtime
    }

    pub fn router(&self) -> &InvalidationRouter {
        &self.router
    }

    pub fn badges(&self) -> &BadgeCounters {
        &self.badges
    }

    /// Make `actor` the signed-in identity and hold `scopes` open.
    ///
    /// Switching to a different actor forgets the previous actor's badges and
    /// outstanding refetches.
    pub async fn sign_in(
        &self,
        actor: ActorId,
        scopes: Vec<ResourceScope>,
    ) -> Result<usize, RealtimeError> {
        if self.realtime.actor().is_some_and(|current| current != actor) {
            self.forget_actor_state();
        }
        let opened = self.realtime.set_actor(actor.clone(), scopes).await?;
        info!(actor = %actor, opened, "Signed in");
        Ok(opened)
    }

    /// Close every channel and forget per-actor state. The cart is kept.
    pub async fn sign_out(&self) {
        self.realtime.logout().await;
        self.forget_actor_state();
        info!("Signed out");
    }

    /// The query layer finished refetching `key`.
    ///
    /// `count` carries the authoritative value for badge-backed queries.
    /// Returns whether a refetch was outstanding.
    pub fn refetch_completed(&self, key: &QueryKey, count: Option<u64>) -> bool {
        let was_pending = self.router.refetch_completed(key);
        if let Some(count) = count {
            if self.badges.record_refetched(key, count) {
                debug!(key = %key, count, "Badge updated");
            }
        }
        was_pending
    }

    /// Close channels, stop routing and write the cart out.
    pub async fn shutdown(self) -> Result<(), CartError> {
        info!("Shutting down client session");
        self.realtime.logout().await;
        self.router_task.abort();
        self.cart.flush_now()
    }

    fn forget_actor_state(&self) {
        self.router.reset();
        self.badges.reset();
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.router_task.abort();
    }
}
