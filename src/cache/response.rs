use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::{CacheKeys, CacheMiss, JsonCache, KeyValueStore};
use crate::config::CacheConfig;

/// Stores the complete result of a create call under the operation name and
/// the caller's idempotency key, so a retried request can be answered without
/// touching the gateway again. The key always comes from the request.
#[derive(Clone)]
pub struct ResponseCache {
    cache: JsonCache,
    keys: CacheKeys,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self {
            cache: JsonCache::new(store, config.response_ttl()),
            keys: CacheKeys::from_config(config),
        }
    }

    pub async fn put<T: Serialize + Sync>(&self, operation: &str, idempotency_key: &str, response: &T) {
        self.cache
            .put(&self.keys.response(operation, idempotency_key), response)
            .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        idempotency_key: &str,
    ) -> Result<T, CacheMiss> {
        self.cache
            .get(&self.keys.response(operation, idempotency_key))
            .await
    }

    pub async fn delete(&self, operation: &str, idempotency_key: &str) {
        self.cache
            .delete(&self.keys.response(operation, idempotency_key))
            .await
    }
}
