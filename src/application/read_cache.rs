use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::CacheStore;

pub const ALL_ORDERS_KEY: &str = "orders.all";

pub fn order_key(order_id: Uuid) -> String {
    format!("orders.{order_id}")
}

/// Read-through cache over an ordered list of tiers.
///
/// A tier that errors (as opposed to missing) hands the lookup to the next
/// tier. When every tier errors the read fails with `CacheUnavailable`; the
/// loader is never used as a last resort. With no tiers configured the cache
/// is disabled and every read goes to the loader.
#[derive(Clone)]
pub struct ReadCache {
    tiers: Vec<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl ReadCache {
    pub fn new(tiers: Vec<Arc<dyn CacheStore>>, ttl: Duration) -> Self {
        Self { tiers, ttl }
    }

    pub fn disabled() -> Self {
        Self::new(Vec::new(), Duration::ZERO)
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|tier| tier.name()).collect()
    }

    pub fn remember<T, F>(&self, key: &str, load: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DomainError>,
    {
        if self.tiers.is_empty() {
            return load();
        }

        let mut last_failure = None;
        for tier in &self.tiers {
            match tier.get(key) {
                Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        log::warn!(
                            "Discarding undecodable cache entry {} in {} tier: {}",
                            key,
                            tier.name(),
                            e
                        );
                        return self.load_and_store(&**tier, key, load);
                    }
                },
                Ok(None) => return self.load_and_store(&**tier, key, load),
                Err(e) => {
                    log::warn!("Cache tier {} failed, falling back: {}", tier.name(), e);
                    last_failure = Some(e);
                }
            }
        }

        let reason = last_failure
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no cache tier answered".to_string());
        log::error!("Failed to read {} from every cache tier: {}", key, reason);
        Err(DomainError::CacheUnavailable(reason))
    }

    /// Drops the order's own entry and the collection entry from every tier.
    /// Failures are logged and never reach the caller.
    pub fn invalidate_order(&self, order_id: Uuid) {
        let keys = [order_key(order_id), ALL_ORDERS_KEY.to_string()];
        for tier in &self.tiers {
            if let Err(e) = tier.forget(&keys) {
                log::warn!(
                    "Failed to invalidate order {} in {} cache tier: {}",
                    order_id,
                    tier.name(),
                    e
                );
            }
        }
    }

    fn load_and_store<T, F>(&self, tier: &dyn CacheStore, key: &str, load: F) -> Result<T, DomainError>
    where
        T: Serialize,
        F: FnOnce() -> Result<T, DomainError>,
    {
        let value = load()?;
        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = tier.put(key, &raw, self.ttl) {
                    log::warn!("Failed to write {} to {} cache tier: {}", key, tier.name(), e);
                }
            }
            Err(e) => log::warn!("Failed to serialize {} for caching: {}", key, e),
        }
        Ok(value)
    }
}
