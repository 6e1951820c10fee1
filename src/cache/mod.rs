//! Key-value caching used for idempotent replays and hot entity reads.
//!
//! Writes are best effort: failures are logged and swallowed so cache
//! trouble never reaches the primary write path. Reads report a [`CacheMiss`]
//! for absent keys, unreachable backends and undecodable payloads alike.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod entity;
pub mod memory;
pub mod redis_store;
pub mod response;

pub use entity::EntityCache;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use response::ResponseCache;

use crate::config::CacheConfig;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    #[error("Cache error: {0}")]
    Other(String),
}

/// Expected outcome of a lookup that found nothing usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cache miss for key {key}")]
pub struct CacheMiss {
    pub key: String,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Builds deterministic keys of the form
/// `<namespace>[:<environment>]:<kind>:<part>...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
    environment: Option<String>,
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>, environment: Option<String>) -> Self {
        Self {
            namespace: namespace.into(),
            environment,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.namespace.clone(), config.environment.clone())
    }

    fn compose(&self, kind: &str, parts: &[&str]) -> String {
        let mut key = self.namespace.clone();
        if let Some(env) = &self.environment {
            key.push(':');
            key.push_str(env);
        }
        key.push(':');
        key.push_str(kind);
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    /// Response keys are scoped by the create operation, so one idempotency
    /// key reused across endpoints maps to separate entries.
    pub fn response(&self, operation: &str, idempotency_key: &str) -> String {
        self.compose("response", &[operation, idempotency_key])
    }

    pub fn customer(&self, app_customer_id: &str) -> String {
        self.compose("customer", &[app_customer_id])
    }

    pub fn payment_method(&self, customer_id: &str, payment_method_id: &str) -> String {
        self.compose("payment_method", &[customer_id, payment_method_id])
    }
}

/// JSON codec over a [`KeyValueStore`] implementing the best-effort contract.
#[derive(Clone)]
pub(crate) struct JsonCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl JsonCache {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub(crate) async fn put<T: Serialize + Sync>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, bytes, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Failed to write cache entry");
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheMiss> {
        let miss = || CacheMiss {
            key: key.to_string(),
        };

        match self.store.get(key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                miss()
            }),
            Ok(None) => Err(miss()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                Err(miss())
            }
        }
    }

    pub(crate) async fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete cache entry");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Backend that fails every call, standing in for an unreachable Redis.
    pub struct UnavailableStore;

    #[async_trait]
    impl KeyValueStore for UnavailableStore {
        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Other("connection refused".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Other("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Other("connection refused".to_string()))
        }
    }
}
