//! Runtime reconfiguration. On SIGHUP the configuration is re-read and only
//! the collaborators whose settings changed are rebuilt and swapped in.

use std::sync::Arc;

use crate::cache::RedisStore;
use crate::config::Config;
use crate::db;
use crate::gateway::HttpGateway;
use crate::registry::Registry;

/// Which collaborators a configuration change affects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChanges {
    pub store: bool,
    pub cache_client: bool,
    pub gateway: bool,
    /// Anything else, e.g. cache TTLs or the request timeout.
    pub settings: bool,
}

impl ConfigChanges {
    pub fn between(old: &Config, new: &Config) -> Self {
        let store = old.database_url != new.database_url
            || old.database_max_connections != new.database_max_connections;
        let cache_client = old.redis_url != new.redis_url;
        let gateway = old.gateway != new.gateway;

        Self {
            store,
            cache_client,
            gateway,
            settings: old != new,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.store || self.cache_client || self.gateway || self.settings)
    }
}

/// Applies `new` to the registry. Collaborators are built before anything is
/// swapped, so a failure leaves the running set untouched.
pub async fn apply(registry: &Registry, new: Config) -> anyhow::Result<ConfigChanges> {
    let current = registry.snapshot();
    let changes = ConfigChanges::between(&current.config, &new);
    if changes.is_empty() {
        return Ok(changes);
    }

    if current.config.server_port != new.server_port {
        tracing::warn!(
            current = current.config.server_port,
            requested = new.server_port,
            "SERVER_PORT cannot change without a restart"
        );
    }

    let pool = if changes.store {
        let pool = db::create_pool(&new).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Some(pool)
    } else {
        None
    };
    let cache = if changes.cache_client {
        let store = RedisStore::new(&new.redis_url)?;
        if let Err(e) = store.ping().await {
            tracing::warn!(error = %e, "Replacement Redis is not reachable yet");
        }
        Some(store)
    } else {
        None
    };
    let gateway = changes.gateway.then(|| HttpGateway::new(&new.gateway));

    if let Some(pool) = pool {
        registry.on_store_connection_replaced(pool);
    }
    if let Some(store) = cache {
        registry.on_cache_client_replaced(Arc::new(store));
    }
    if let Some(gateway) = gateway {
        registry.on_gateway_replaced(Arc::new(gateway));
    }
    registry.on_config_replaced(new);

    Ok(changes)
}

#[cfg(unix)]
pub async fn watch_sighup(registry: Arc<Registry>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    while hangup.recv().await.is_some() {
        tracing::info!("SIGHUP received, reloading configuration");
        let config = match Config::reload_from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Configuration reload failed, keeping current settings");
                continue;
            }
        };
        match apply(&registry, config).await {
            Ok(changes) if changes.is_empty() => tracing::info!("Configuration unchanged"),
            Ok(changes) => tracing::info!(?changes, "Configuration reloaded"),
            Err(e) => tracing::error!(error = %e, "Configuration reload failed, keeping current settings"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::test_config;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn test_identical_configs_have_no_changes() {
        let config = test_config();
        assert!(ConfigChanges::between(&config, &config.clone()).is_empty());
    }

    #[test]
    fn test_gateway_change_is_isolated() {
        let old = test_config();
        let mut new = old.clone();
        new.gateway.secret_key = "xnd_rotated".to_string();

        let changes = ConfigChanges::between(&old, &new);
        assert!(changes.gateway);
        assert!(!changes.store);
        assert!(!changes.cache_client);
        assert!(changes.settings);
    }

    #[test]
    fn test_pool_size_change_rebuilds_store() {
        let old = test_config();
        let mut new = old.clone();
        new.database_max_connections = 25;
        assert!(ConfigChanges::between(&old, &new).store);
    }

    #[tokio::test]
    async fn test_settings_only_change_swaps_config() {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let gateway = Arc::new(HttpGateway::new(&config.gateway));
        let registry = Registry::new(pool, Arc::new(MemoryStore::new()), gateway, config.clone());

        let mut new = config;
        new.cache.response_ttl_secs = 60;
        new.request_timeout_secs = 5;

        let changes = apply(&registry, new).await.unwrap();
        assert!(changes.settings);
        assert!(!changes.store && !changes.cache_client && !changes.gateway);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.config.cache.response_ttl_secs, 60);
        assert_eq!(snapshot.config.request_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_gateway_change_swaps_gateway() {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let gateway: Arc<dyn crate::gateway::PaymentGateway> =
            Arc::new(HttpGateway::new(&config.gateway));
        let registry = Registry::new(pool, Arc::new(MemoryStore::new()), gateway.clone(), config.clone());

        let mut new = config;
        new.gateway.base_url = "http://127.0.0.1:9".to_string();
        apply(&registry, new).await.unwrap();

        assert!(!Arc::ptr_eq(&registry.snapshot().gateway, &gateway));
    }
}
