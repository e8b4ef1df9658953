use std::collections::HashMap;

use super::errors::DomainError;
use super::order::{OrderItemRequest, PricedLine};
use super::ports::OrderTransaction;
use super::stock::ProductStock;

/// Turns requested cart lines into priced order lines, reserving stock for
/// each one as it goes.
///
/// Every requested product is locked up front in one batch, so two orders
/// naming the same products in a different order wait on each other instead
/// of deadlocking. Lines are then checked in request order and the first
/// failure stops the batch. Reservations already made are undone by the
/// enclosing transaction rolling back, never by this builder.
pub struct OrderItemBuilder;

impl OrderItemBuilder {
    pub fn build(
        tx: &mut dyn OrderTransaction,
        requests: &[OrderItemRequest],
    ) -> Result<Vec<PricedLine>, DomainError> {
        let ids: Vec<_> = requests.iter().map(|r| r.product_id).collect();
        let mut locked: HashMap<_, _> = tx
            .lock_products(&ids)?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let mut lines = Vec::with_capacity(requests.len());
        for request in requests {
            if request.quantity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for product {} must be at least 1",
                    request.product_id
                )));
            }

            // Kept in the map so a repeated product sees earlier reservations.
            let product = locked
                .get_mut(&request.product_id)
                .ok_or(DomainError::ProductNotFound(request.product_id))?;

            if !ProductStock::has_stock(product, request.quantity) {
                return Err(DomainError::InsufficientStock {
                    product_name: product.name.clone(),
                    available: product.stock,
                    requested: request.quantity,
                });
            }

            let line = PricedLine::for_product(product, request.quantity);
            ProductStock::decrease(tx, product, request.quantity)?;
            lines.push(line);
        }

        Ok(lines)
    }
}
