use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, VariantRecord};
use crate::schema::{order_items, orders, payment_logs, product_variants};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub total: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub gateway_trade_no: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub id: Uuid,
    pub order_no: &'a str,
    pub user_id: Option<Uuid>,
    pub email: &'a str,
    pub total: &'a BigDecimal,
    pub status: &'a str,
    pub payment_status: &'a str,
    pub payment_method: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_label: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub line_no: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: &'a str,
    pub variant_label: &'a str,
    pub price: &'a BigDecimal,
    pub quantity: i32,
    pub line_no: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = product_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub price: BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_variants)]
pub struct NewVariantRow<'a> {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: &'a str,
    pub price: &'a BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentLogRow {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub order_no: Option<String>,
    pub action: String,
    pub raw_data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_logs)]
pub struct NewPaymentLogRow<'a> {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub order_no: Option<&'a str>,
    pub action: &'a str,
    pub raw_data: &'a Value,
}

impl From<VariantRow> for VariantRecord {
    fn from(row: VariantRow) -> Self {
        VariantRecord {
            id: row.id,
            product_id: row.product_id,
            price: row.price,
            stock: row.stock,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            variant_label: row.variant_label,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            status: self.status.parse()?,
            payment_status: self.payment_status.parse()?,
            payment_method: self.payment_method.parse()?,
            order_no: self.order_no,
            user_id: self.user_id,
            email: self.email,
            total: self.total,
            gateway_trade_no: self.gateway_trade_no,
            payment_date: self.payment_date,
            created_at: self.created_at,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}
