use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Which order mutation was running when an unexpected failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OrderOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderOperation::Create => f.write_str("create"),
            OrderOperation::Update => f.write_str("update"),
            OrderOperation::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    OrderNotFound,
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),
    #[error("Customer {0} not found")]
    CustomerNotFound(Uuid),
    #[error("Insufficient stock for product {product_name}")]
    InsufficientStock {
        product_name: String,
        available: i32,
        requested: i32,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Failed to {operation} order: {source}")]
    OrderMutationFailed {
        operation: OrderOperation,
        order_id: Option<Uuid>,
        #[source]
        source: Box<DomainError>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Business-rule failures travel to the API boundary as-is; everything
    /// else gets wrapped with the operation that was running.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            DomainError::InsufficientStock { .. }
                | DomainError::InvalidInput(_)
                | DomainError::OrderNotFound
                | DomainError::ProductNotFound(_)
                | DomainError::CustomerNotFound(_)
        )
    }

    pub fn wrap_mutation(self, operation: OrderOperation, order_id: Option<Uuid>) -> Self {
        if self.is_business_rule() {
            return self;
        }
        if let DomainError::OrderMutationFailed { .. } = self {
            return self;
        }
        DomainError::OrderMutationFailed {
            operation,
            order_id,
            source: Box::new(self),
        }
    }
}
