use std::time::Duration;

use crate::domain::ports::{CacheError, CacheStore};

const TIER: &str = "redis";

/// Primary cache tier. Opens a fresh connection per call; the client itself
/// holds no sockets, so a Redis outage only surfaces as per-call errors.
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn connection(&self) -> Result<redis::Connection, CacheError> {
        self.client.get_connection().map_err(failure)
    }
}

fn failure(e: redis::RedisError) -> CacheError {
    CacheError::new(TIER, e)
}

impl CacheStore for RedisCache {
    fn name(&self) -> &str {
        TIER
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection()?;
        redis::cmd("GET")
            .arg(key)
            .query::<Option<String>>(&mut conn)
            .map_err(failure)
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        // PX rejects zero; a 1ms entry is as good as expired, like the database tier.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query::<()>(&mut conn)
            .map_err(failure)
    }

    fn forget(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;
        redis::cmd("DEL")
            .arg(keys)
            .query::<i64>(&mut conn)
            .map(|_| ())
            .map_err(failure)
    }
}
