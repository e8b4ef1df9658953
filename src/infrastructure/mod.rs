pub mod db_cache;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod order_store;
pub mod redis_cache;
#[cfg(test)]
pub mod testing;
