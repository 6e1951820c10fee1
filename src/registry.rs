//! Process-wide collaborator handles that can be replaced at runtime.
//!
//! Every operation takes one [`Collaborators`] snapshot at entry and uses it
//! to the end, so a swap only affects operations that start afterwards.

use arc_swap::ArcSwap;
use sqlx::PgPool;
use std::sync::Arc;

use crate::cache::{EntityCache, KeyValueStore, ResponseCache};
use crate::config::Config;
use crate::gateway::PaymentGateway;
use crate::services::lookup::LookupNames;

#[derive(Clone)]
pub struct Collaborators {
    pub pool: PgPool,
    pub cache: Arc<dyn KeyValueStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Arc<Config>,
    /// Tied to `pool`; replaced together with it.
    pub lookups: Arc<LookupNames>,
}

impl Collaborators {
    pub fn response_cache(&self) -> ResponseCache {
        ResponseCache::new(self.cache.clone(), &self.config.cache)
    }

    pub fn entity_cache(&self) -> EntityCache {
        EntityCache::new(self.cache.clone(), &self.config.cache)
    }
}

pub struct Registry {
    inner: ArcSwap<Collaborators>,
}

impl Registry {
    pub fn new(
        pool: PgPool,
        cache: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: Config,
    ) -> Self {
        Self {
            inner: ArcSwap::from_pointee(Collaborators {
                pool,
                cache,
                gateway,
                config: Arc::new(config),
                lookups: Arc::new(LookupNames::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<Collaborators> {
        self.inner.load_full()
    }

    pub fn on_store_connection_replaced(&self, pool: PgPool) {
        self.inner.rcu(|current| {
            let mut next = Collaborators::clone(current);
            next.pool = pool.clone();
            next.lookups = Arc::new(LookupNames::new());
            next
        });
        tracing::info!("Store connection pool replaced");
    }

    pub fn on_cache_client_replaced(&self, cache: Arc<dyn KeyValueStore>) {
        self.inner.rcu(|current| {
            let mut next = Collaborators::clone(current);
            next.cache = cache.clone();
            next
        });
        tracing::info!("Cache client replaced");
    }

    pub fn on_gateway_replaced(&self, gateway: Arc<dyn PaymentGateway>) {
        self.inner.rcu(|current| {
            let mut next = Collaborators::clone(current);
            next.gateway = gateway.clone();
            next
        });
        tracing::info!("Gateway client replaced");
    }

    pub fn on_config_replaced(&self, config: Config) {
        let config = Arc::new(config);
        self.inner.rcu(|current| {
            let mut next = Collaborators::clone(current);
            next.config = config.clone();
            next
        });
        tracing::info!("Configuration replaced");
    }
}
