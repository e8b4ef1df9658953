use std::time::Duration;

use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::db::DbPool;
use crate::domain::ports::{CacheError, CacheStore};
use crate::schema::cache;

use super::models::CacheEntryRow;

const TIER: &str = "database";

/// Cache tier backed by the `cache` table. Expired rows read as misses and
/// are overwritten by the next write.
pub struct DatabaseCache {
    pool: DbPool,
}

impl DatabaseCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn failure(e: impl ToString) -> CacheError {
    CacheError::new(TIER, e)
}

impl CacheStore for DatabaseCache {
    fn name(&self) -> &str {
        TIER
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.pool.get().map_err(failure)?;
        cache::table
            .filter(cache::key.eq(key))
            .filter(cache::expires_at.gt(Utc::now()))
            .select(cache::value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(failure)
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(failure)?;
        let mut conn = self.pool.get().map_err(failure)?;
        diesel::insert_into(cache::table)
            .values(&CacheEntryRow {
                key: key.to_string(),
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            })
            .on_conflict(cache::key)
            .do_update()
            .set((
                cache::value.eq(excluded(cache::value)),
                cache::expires_at.eq(excluded(cache::expires_at)),
            ))
            .execute(&mut conn)
            .map_err(failure)?;
        Ok(())
    }

    fn forget(&self, keys: &[String]) -> Result<(), CacheError> {
        let mut conn = self.pool.get().map_err(failure)?;
        diesel::delete(cache::table.filter(cache::key.eq_any(keys)))
            .execute(&mut conn)
            .map_err(failure)?;
        Ok(())
    }
}
