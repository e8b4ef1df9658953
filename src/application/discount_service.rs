use uuid::Uuid;

use crate::domain::discount::{DiscountEngine, DiscountResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::OrderStore;

pub struct DiscountService<S> {
    store: S,
    engine: DiscountEngine,
}

impl<S: OrderStore> DiscountService<S> {
    pub fn new(store: S, engine: DiscountEngine) -> Self {
        Self { store, engine }
    }

    /// Prices the discounts for an order's current items. Nothing is written.
    pub fn calculate_discounts(&self, order_id: Uuid) -> Result<DiscountResult, DomainError> {
        let lines = self
            .store
            .discount_lines(order_id)?
            .ok_or(DomainError::OrderNotFound)?;
        Ok(self.engine.calculate(order_id, &lines))
    }
}
