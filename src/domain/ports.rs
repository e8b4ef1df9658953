use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{DiscountLine, OrderView, PricedLine, Product, ReservedLine};

/// Operations available while a single order transaction is open.
///
/// Everything done through one `OrderTransaction` commits or rolls back
/// together; implementations must lock the rows they hand out so concurrent
/// transactions on the same product or order serialize.
pub trait OrderTransaction {
    fn customer_exists(&mut self, customer_id: Uuid) -> Result<bool, DomainError>;

    /// Inserts a new order with a zero total and returns its id.
    fn insert_order(&mut self, customer_id: Uuid) -> Result<Uuid, DomainError>;

    /// Locks a live (not soft-deleted) order row. `false` when absent.
    fn lock_order(&mut self, order_id: Uuid) -> Result<bool, DomainError>;

    fn live_items(&mut self, order_id: Uuid) -> Result<Vec<ReservedLine>, DomainError>;

    /// Reads and locks the given product rows for the rest of the
    /// transaction, acquiring the locks in ascending id order. Unknown ids are
    /// left out of the result.
    fn lock_products(&mut self, product_ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;

    /// Subtracts `quantity` only if enough stock is left; returns whether it did.
    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, DomainError>;

    fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError>;

    fn insert_items(&mut self, order_id: Uuid, lines: &[PricedLine]) -> Result<(), DomainError>;

    fn soft_delete_items(&mut self, order_id: Uuid) -> Result<(), DomainError>;

    fn set_total(&mut self, order_id: Uuid, total: &BigDecimal) -> Result<(), DomainError>;

    fn soft_delete_order(&mut self, order_id: Uuid) -> Result<(), DomainError>;

    /// Eagerly loads the order with its customer, items and products.
    fn load_order(&mut self, order_id: Uuid) -> Result<Option<OrderView>, DomainError>;
}

pub trait OrderStore: Send + Sync + 'static {
    /// Runs `work` inside one transaction, committing on `Ok` and rolling
    /// back on `Err`.
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTransaction) -> Result<T, DomainError>;

    fn find_order(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError>;

    fn list_orders(&self) -> Result<Vec<OrderView>, DomainError>;

    /// Lines of a live order with each product's category; `None` when the
    /// order does not exist.
    fn discount_lines(&self, order_id: Uuid) -> Result<Option<Vec<DiscountLine>>, DomainError>;
}

impl<S: OrderStore> OrderStore for Arc<S> {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTransaction) -> Result<T, DomainError>,
    {
        (**self).transaction(work)
    }

    fn find_order(&self, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        (**self).find_order(order_id)
    }

    fn list_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        (**self).list_orders()
    }

    fn discount_lines(&self, order_id: Uuid) -> Result<Option<Vec<DiscountLine>>, DomainError> {
        (**self).discount_lines(order_id)
    }
}

#[derive(Debug, Error)]
#[error("{tier} cache: {message}")]
pub struct CacheError {
    pub tier: String,
    pub message: String,
}

impl CacheError {
    pub fn new(tier: impl Into<String>, message: impl ToString) -> Self {
        Self {
            tier: tier.into(),
            message: message.to_string(),
        }
    }
}

/// One tier of the read cache. Values are opaque serialized strings.
pub trait CacheStore: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    fn forget(&self, keys: &[String]) -> Result<(), CacheError>;
}
