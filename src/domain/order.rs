use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::errors::DomainError;

// ── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    Credit,
    #[serde(rename = "ATM")]
    Atm,
    #[serde(rename = "CVS")]
    Cvs,
}

impl PaymentMethod {
    /// The gateway's `ChoosePayment` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "Credit",
            PaymentMethod::Atm => "ATM",
            PaymentMethod::Cvs => "CVS",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Credit" => Ok(PaymentMethod::Credit),
            "ATM" => Ok(PaymentMethod::Atm),
            "CVS" => Ok(PaymentMethod::Cvs),
            other => Err(DomainError::Internal(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::Internal(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Create,
    Callback,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Create => "create",
            LogAction::Callback => "callback",
        }
    }
}

// ── Checkout input ───────────────────────────────────────────────────────────

/// One cart line as submitted by the client. `claimed_price` is untrusted and
/// only kept to detect tampering.
#[derive(Debug, Clone, Validate)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "product name must be 1 to 255 characters"))]
    pub product_name: String,
    #[validate(length(min = 1, max = 100, message = "variant label must be 1 to 100 characters"))]
    pub variant_label: String,
    pub claimed_price: Option<BigDecimal>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Validate)]
pub struct CheckoutRequest {
    #[validate]
    pub lines: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    #[validate(email(message = "a valid email address is required"))]
    pub email: String,
    pub user_id: Option<Uuid>,
}

/// Authoritative price and stock of a variant, as held by the store.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub price: BigDecimal,
    pub stock: i32,
}

/// A cart line whose price has been replaced by the store's price.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedLine {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_label: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

impl VerifiedLine {
    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct VerifiedOrder {
    pub lines: Vec<VerifiedLine>,
    pub total: BigDecimal,
}

/// Everything the order writer needs to persist a new order atomically.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_no: String,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub total: BigDecimal,
    pub payment_method: PaymentMethod,
    pub lines: Vec<VerifiedLine>,
}

// ── Persisted order ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_label: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway_trade_no: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

// ── Settlement ───────────────────────────────────────────────────────────────

/// A verified gateway result for one order.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub order_no: String,
    pub succeeded: bool,
    pub trade_no: String,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    NotFound,
    AlreadyPaid { order_id: Uuid },
    Applied {
        order_id: Uuid,
        payment_status: PaymentStatus,
    },
}

#[derive(Debug, Clone)]
pub struct PaymentLogEntry {
    pub order_id: Option<Uuid>,
    pub order_no: Option<String>,
    pub action: LogAction,
    pub raw_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_uses_gateway_spelling() {
        assert_eq!(PaymentMethod::Atm.as_str(), "ATM");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cvs).unwrap(),
            "\"CVS\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"Credit\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Credit);
    }

    #[test]
    fn statuses_parse_their_own_text() {
        for status in [PaymentStatus::Unpaid, PaymentStatus::Paid, PaymentStatus::Failed] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let line = VerifiedLine {
            product_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            product_name: "Steam Wallet".into(),
            variant_label: "NT$500".into(),
            price: BigDecimal::from(500),
            quantity: 3,
        };
        assert_eq!(line.line_total(), BigDecimal::from(1500));
    }
}
