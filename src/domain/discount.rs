use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::order::{round_money, sum_money, DiscountLine};

/// Thresholds and rates for the promotional rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRules {
    /// Combined quantity within one category needed for the category discount.
    pub category_min_items: i64,
    pub category_rate_percent: u32,
    /// Subtotal at or above which the whole order is discounted.
    pub total_min_amount: BigDecimal,
    pub total_rate_percent: u32,
}

impl Default for DiscountRules {
    fn default() -> Self {
        Self {
            category_min_items: 6,
            category_rate_percent: 10,
            total_min_amount: BigDecimal::from(1000),
            total_rate_percent: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppliedDiscount {
    Category {
        category_id: i32,
        item_count: i64,
        rate_percent: u32,
        amount: BigDecimal,
    },
    TotalAmount {
        min_amount: BigDecimal,
        order_total: BigDecimal,
        rate_percent: u32,
        amount: BigDecimal,
    },
}

impl AppliedDiscount {
    pub fn amount(&self) -> &BigDecimal {
        match self {
            AppliedDiscount::Category { amount, .. } | AppliedDiscount::TotalAmount { amount, .. } => {
                amount
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountResult {
    pub order_id: Uuid,
    pub subtotal: BigDecimal,
    pub discounts: Vec<AppliedDiscount>,
    pub total_discount: BigDecimal,
    pub total: BigDecimal,
}

/// Evaluates the discount rules against an order's lines.
///
/// The rules are independent and stack: each one is computed off the
/// original subtotal, rounded to cents on its own, and only then summed.
#[derive(Debug, Clone, Default)]
pub struct DiscountEngine {
    rules: DiscountRules,
}

impl DiscountEngine {
    pub fn new(rules: DiscountRules) -> Self {
        Self { rules }
    }

    pub fn calculate(&self, order_id: Uuid, lines: &[DiscountLine]) -> DiscountResult {
        let subtotal = sum_money(lines.iter().map(|line| &line.total));

        let mut discounts = self.category_discounts(lines);
        if let Some(discount) = self.total_amount_discount(&subtotal) {
            discounts.push(discount);
        }

        let total_discount = sum_money(discounts.iter().map(AppliedDiscount::amount));
        let total = round_money(&(&subtotal - &total_discount));

        DiscountResult {
            order_id,
            subtotal,
            discounts,
            total_discount,
            total,
        }
    }

    /// One discount per qualifying category, in ascending category order.
    fn category_discounts(&self, lines: &[DiscountLine]) -> Vec<AppliedDiscount> {
        let mut by_category: BTreeMap<i32, (i64, BigDecimal)> = BTreeMap::new();
        for line in lines {
            let entry = by_category
                .entry(line.category_id)
                .or_insert_with(|| (0, BigDecimal::zero()));
            entry.0 += i64::from(line.quantity);
            entry.1 += &line.total;
        }

        by_category
            .into_iter()
            .filter(|(_, (item_count, _))| *item_count >= self.rules.category_min_items)
            .map(|(category_id, (item_count, category_total))| AppliedDiscount::Category {
                category_id,
                item_count,
                rate_percent: self.rules.category_rate_percent,
                amount: percent_of(&category_total, self.rules.category_rate_percent),
            })
            .collect()
    }

    fn total_amount_discount(&self, subtotal: &BigDecimal) -> Option<AppliedDiscount> {
        if *subtotal < self.rules.total_min_amount {
            return None;
        }
        Some(AppliedDiscount::TotalAmount {
            min_amount: self.rules.total_min_amount.clone(),
            order_total: subtotal.clone(),
            rate_percent: self.rules.total_rate_percent,
            amount: percent_of(subtotal, self.rules.total_rate_percent),
        })
    }
}

fn percent_of(amount: &BigDecimal, percent: u32) -> BigDecimal {
    round_money(&(amount * BigDecimal::from(percent) / BigDecimal::from(100u32)))
}
