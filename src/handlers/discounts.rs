use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::discount_service::DiscountService;
use crate::domain::discount::{AppliedDiscount, DiscountResult};
use crate::errors::AppError;
use crate::infrastructure::order_store::DieselOrderStore;

use super::orders::money;

pub type Discounts = DiscountService<DieselOrderStore>;

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountResponse {
    Category {
        category_id: i32,
        item_count: i64,
        /// e.g. "10%"
        discount_rate: String,
        amount: String,
    },
    TotalAmount {
        min_amount: String,
        order_total: String,
        discount_rate: String,
        amount: String,
    },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountBreakdownResponse {
    pub order_id: Uuid,
    pub subtotal: String,
    pub discounts: Vec<DiscountResponse>,
    pub total_discount: String,
    pub total: String,
}

fn rate(percent: u32) -> String {
    format!("{}%", percent)
}

impl From<AppliedDiscount> for DiscountResponse {
    fn from(discount: AppliedDiscount) -> Self {
        match discount {
            AppliedDiscount::Category {
                category_id,
                item_count,
                rate_percent,
                amount,
            } => DiscountResponse::Category {
                category_id,
                item_count,
                discount_rate: rate(rate_percent),
                amount: money(&amount),
            },
            AppliedDiscount::TotalAmount {
                min_amount,
                order_total,
                rate_percent,
                amount,
            } => DiscountResponse::TotalAmount {
                min_amount: money(&min_amount),
                order_total: money(&order_total),
                discount_rate: rate(rate_percent),
                amount: money(&amount),
            },
        }
    }
}

impl From<DiscountResult> for DiscountBreakdownResponse {
    fn from(result: DiscountResult) -> Self {
        DiscountBreakdownResponse {
            order_id: result.order_id,
            subtotal: money(&result.subtotal),
            discounts: result.discounts.into_iter().map(Into::into).collect(),
            total_discount: money(&result.total_discount),
            total: money(&result.total),
        }
    }
}

/// POST /orders/{id}/calculate-discount
///
/// Read-only: computes the breakdown without changing the order.
#[utoipa::path(
    post,
    path = "/orders/{id}/calculate-discount",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Discount breakdown", body = DiscountBreakdownResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "discounts"
)]
pub async fn calculate_discount(
    discounts: web::Data<Discounts>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = web::block(move || discounts.calculate_discounts(order_id))
        .await?
        .map_err(|e| AppError::from_domain("Error calculating discounts", e))?;

    Ok(HttpResponse::Ok().json(DiscountBreakdownResponse::from(result)))
}
