use std::sync::Arc;

use super::{CacheKeys, CacheMiss, JsonCache, KeyValueStore};
use crate::config::CacheConfig;
use crate::db::models::{Customer, PaymentMethod};

/// Read-through cache for hot entities. Never authoritative: a miss says
/// nothing about whether the entity exists, so callers fall back to the
/// store.
#[derive(Clone)]
pub struct EntityCache {
    cache: JsonCache,
    keys: CacheKeys,
}

impl EntityCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self {
            cache: JsonCache::new(store, config.entity_ttl()),
            keys: CacheKeys::from_config(config),
        }
    }

    pub async fn put_customer(&self, customer: &Customer) {
        self.cache
            .put(&self.keys.customer(&customer.app_customer_id), customer)
            .await
    }

    pub async fn get_customer(&self, app_customer_id: &str) -> Result<Customer, CacheMiss> {
        self.cache.get(&self.keys.customer(app_customer_id)).await
    }

    pub async fn delete_customer(&self, app_customer_id: &str) {
        self.cache.delete(&self.keys.customer(app_customer_id)).await
    }

    pub async fn put_payment_method(&self, method: &PaymentMethod) {
        let key = self
            .keys
            .payment_method(&method.customer_id, &method.payment_method_id);
        self.cache.put(&key, method).await
    }

    pub async fn get_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, CacheMiss> {
        self.cache
            .get(&self.keys.payment_method(customer_id, payment_method_id))
            .await
    }

    pub async fn delete_payment_method(&self, customer_id: &str, payment_method_id: &str) {
        self.cache
            .delete(&self.keys.payment_method(customer_id, payment_method_id))
            .await
    }
}
