use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::order::{round_money, Customer, OrderItemRequest, OrderItemView, OrderView, Product};
use crate::errors::AppError;
use crate::infrastructure::order_store::DieselOrderStore;

pub type Orders = OrderService<DieselOrderStore>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemRequest {
    pub product_id: Uuid,
    /// Must be at least 1.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub items: Vec<ItemRequest>,
}

/// The customer of an order cannot be changed; only its items are replaced.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub since: NaiveDate,
    /// Decimal as a string, e.g. "492.12"
    pub revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category_id: i32,
    pub price: String,
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: String,
    pub total: String,
    pub product: ProductResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer: CustomerResponse,
    pub total: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub data: Vec<OrderResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub data: OrderResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Money always leaves the service with two decimal places.
pub fn money(amount: &BigDecimal) -> String {
    round_money(amount).to_string()
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        CustomerResponse {
            id: c.id,
            name: c.name,
            since: c.since,
            revenue: money(&c.revenue),
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            category_id: p.category_id,
            price: money(&p.price),
            stock: p.stock,
        }
    }
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        OrderItemResponse {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: money(&item.unit_price),
            total: money(&item.total),
            product: item.product.into(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        OrderResponse {
            id: order.id,
            customer_id: order.customer_id,
            customer: order.customer.into(),
            total: money(&order.total),
            created_at: order.created_at,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rejects malformed carts before they reach the order lifecycle.
pub fn validate_items(items: &[ItemRequest]) -> Result<Vec<OrderItemRequest>, AppError> {
    if items.is_empty() {
        return Err(AppError::validation("The items field is required."));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.quantity < 1 {
                return Err(AppError::validation(format!(
                    "The items.{}.quantity must be at least 1.",
                    i
                )));
            }
            Ok(OrderItemRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
        })
        .collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Returns every live order with its customer and items.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = OrderListResponse),
        (status = 503, description = "Cache unavailable"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(orders: web::Data<Orders>) -> Result<HttpResponse, AppError> {
    let views = web::block(move || orders.get_all_orders())
        .await?
        .map_err(|e| AppError::from_domain("Error fetching orders", e))?;

    Ok(HttpResponse::Ok().json(OrderListResponse {
        data: views.into_iter().map(Into::into).collect(),
    }))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderEnvelope),
        (status = 404, description = "Order not found"),
        (status = 503, description = "Cache unavailable"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    orders: web::Data<Orders>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let view = web::block(move || orders.get_order(order_id))
        .await?
        .map_err(|e| AppError::from_domain("Error fetching order", e))?;

    Ok(HttpResponse::Ok().json(OrderEnvelope {
        data: view.into(),
        message: None,
    }))
}

/// POST /orders
///
/// Reserves stock for every item and stores the order in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderEnvelope),
        (status = 404, description = "Customer or product not found"),
        (status = 422, description = "Invalid items or insufficient stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    orders: web::Data<Orders>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = validate_items(&body.items)?;
    let customer_id = body.customer_id;

    let view = web::block(move || orders.create_order(customer_id, &items))
        .await?
        .map_err(|e| AppError::from_domain("Error creating order", e))?;

    Ok(HttpResponse::Created().json(OrderEnvelope {
        data: view.into(),
        message: Some("Order created successfully".to_string()),
    }))
}

/// PUT /orders/{id}
///
/// Gives back the stock of the current items, then reserves the new ones.
/// Either both happen or neither does.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated successfully", body = OrderEnvelope),
        (status = 404, description = "Order or product not found"),
        (status = 422, description = "Invalid items or insufficient stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    orders: web::Data<Orders>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let items = validate_items(&body.into_inner().items)?;

    let view = web::block(move || orders.update_order(order_id, &items))
        .await?
        .map_err(|e| AppError::from_domain("Error updating order", e))?;

    Ok(HttpResponse::Ok().json(OrderEnvelope {
        data: view.into(),
        message: Some("Order updated successfully".to_string()),
    }))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order deleted and stock restored", body = MessageResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    orders: web::Data<Orders>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || orders.delete_order(order_id))
        .await?
        .map_err(|e| AppError::from_domain("Error deleting order", e))?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Order deleted successfully".to_string(),
    }))
}
