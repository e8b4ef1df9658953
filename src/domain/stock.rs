use uuid::Uuid;

use super::errors::DomainError;
use super::order::Product;
use super::ports::OrderTransaction;

/// Stock reservation and restoration for products, applied through the
/// owning transaction so concurrent orders cannot lose updates.
pub struct ProductStock;

impl ProductStock {
    pub fn has_stock(product: &Product, quantity: i32) -> bool {
        quantity <= product.stock
    }

    /// Reserves `quantity` units. Fails rather than clamping when the product
    /// has fewer units left; `product.stock` mirrors the new value on success.
    pub fn decrease(
        tx: &mut dyn OrderTransaction,
        product: &mut Product,
        quantity: i32,
    ) -> Result<(), DomainError> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity for product {} must be at least 1",
                product.name
            )));
        }
        if !Self::has_stock(product, quantity) || !tx.decrement_stock(product.id, quantity)? {
            return Err(DomainError::InsufficientStock {
                product_name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }
        product.stock -= quantity;
        Ok(())
    }

    /// Gives `quantity` units back. Restoring has no upper bound.
    pub fn increase(
        tx: &mut dyn OrderTransaction,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), DomainError> {
        tx.increment_stock(product_id, quantity)
    }
}
