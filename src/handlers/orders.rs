use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::AppState;
use crate::application::PaymentTracked;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use crate::domain::ports::OrderStore;
use crate::errors::AppError;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_label: String,
    /// Unit price charged, as a decimal string.
    pub price: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_no: String,
    pub email: String,
    pub total: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway_trade_no: Option<String>,
    pub payment_date: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            id: item.id,
            product_id: item.product_id,
            variant_id: item.variant_id,
            product_name: item.product_name,
            variant_label: item.variant_label,
            price: item.price.to_string(),
            quantity: item.quantity,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            order_no: order.order_no,
            email: order.email,
            total: order.total.to_string(),
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            gateway_trade_no: order.gateway_trade_no,
            payment_date: order.payment_date.map(|d| d.to_rfc3339()),
            created_at: order.created_at.to_rfc3339(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl PaymentTracked for OrderResponse {
    fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{order_no}
///
/// Read by the result page while it waits for the gateway notification.
#[utoipa::path(
    get,
    path = "/orders/{order_no}",
    params(
        ("order_no" = String, Path, description = "Merchant order number, e.g. ORDLX3K9Q2A7B1C"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_no = path.into_inner();

    let order = web::block(move || state.store.find_by_order_no(&order_no))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??
        .ok_or(DomainError::OrderNotFound)?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
