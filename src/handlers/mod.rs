pub mod discounts;
pub mod health;
pub mod orders;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        discounts::calculate_discount,
        health::health,
    ),
    components(schemas(
        orders::ItemRequest,
        orders::CreateOrderRequest,
        orders::UpdateOrderRequest,
        orders::CustomerResponse,
        orders::ProductResponse,
        orders::OrderItemResponse,
        orders::OrderResponse,
        orders::OrderListResponse,
        orders::OrderEnvelope,
        orders::MessageResponse,
        discounts::DiscountResponse,
        discounts::DiscountBreakdownResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "orders", description = "Order lifecycle with stock reservation"),
        (name = "discounts", description = "Promotional discount breakdown"),
        (name = "health", description = "Liveness check"),
    )
)]
pub struct ApiDoc;
