use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rounds a monetary amount to cents, half away from zero.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Sum of line totals, rounded to cents.
pub fn sum_money<'a, I>(amounts: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let sum = amounts
        .into_iter()
        .fold(BigDecimal::zero(), |acc, amount| acc + amount);
    round_money(&sum)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: i32,
    pub price: BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub since: NaiveDate,
    pub revenue: BigDecimal,
}

/// One cart line as requested by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A validated line, priced with the product's price at the time of ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total: BigDecimal,
}

impl PricedLine {
    pub fn for_product(product: &Product, quantity: i32) -> Self {
        let unit_price = round_money(&product.price);
        let total = round_money(&(&unit_price * BigDecimal::from(quantity)));
        Self {
            product_id: product.id,
            quantity,
            unit_price,
            total,
        }
    }
}

/// The minimum needed to give reserved stock back when a line goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total: BigDecimal,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer: Customer,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// An order line reduced to what the discount rules look at.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountLine {
    pub category_id: i32,
    pub quantity: i32,
    pub total: BigDecimal,
}
