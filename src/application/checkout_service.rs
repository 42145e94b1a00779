use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutRequest, LogAction, NewOrder, PaymentLogEntry};
use crate::domain::ports::OrderStore;
use crate::domain::validator::validate_checkout;
use crate::gateway::{build_payment_request, CheckMacCodec, GatewayRedirect};

const ORDER_NO_PREFIX: &str = "ORD";
const ORDER_NO_SUFFIX_LEN: usize = 5;
pub const ORDER_NO_MAX_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: Uuid,
    pub order_no: String,
    pub redirect: GatewayRedirect,
}

pub struct CheckoutService<S> {
    store: S,
    gateway: GatewayConfig,
    codec: CheckMacCodec,
}

impl<S: OrderStore> CheckoutService<S> {
    pub fn new(store: S, gateway: GatewayConfig) -> Self {
        let codec = gateway.codec();
        Self {
            store,
            gateway,
            codec,
        }
    }

    /// Validates the cart, writes the order with its stock decrement, and
    /// returns the signed gateway request.
    ///
    /// The order exists (unpaid, stock taken) once this returns, whether or
    /// not the buyer ever completes payment.
    pub fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, DomainError> {
        let verified = validate_checkout(&self.store, &request)?;

        let now = Utc::now();
        let order_no = generate_order_no(now);
        let new_order = NewOrder {
            order_no: order_no.clone(),
            user_id: request.user_id,
            email: request.email.clone(),
            total: verified.total.clone(),
            payment_method: request.payment_method,
            lines: verified.lines.clone(),
        };

        let order_id = self.store.create_order(&new_order)?;
        log::info!(
            "Created order {} ({}) total={} items={}",
            order_no,
            order_id,
            verified.total,
            verified.lines.len()
        );

        let entry = PaymentLogEntry {
            order_id: Some(order_id),
            order_no: Some(order_no.clone()),
            action: LogAction::Create,
            raw_data: json!({
                "items": verified.lines,
                "payment_method": request.payment_method,
                "email": request.email,
                "user_id": request.user_id,
            }),
        };
        if let Err(e) = self.store.append_log(&entry) {
            log::warn!("Failed to record create log for order {}: {}", order_no, e);
        }

        let redirect = build_payment_request(
            &self.gateway,
            &self.codec,
            &order_no,
            &verified.lines,
            &verified.total,
            request.payment_method,
            now,
        );

        Ok(CheckoutOutcome {
            order_id,
            order_no,
            redirect,
        })
    }
}

/// `ORD` + base-36 milliseconds + a random base-36 suffix, upper case.
pub fn generate_order_no(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let random = u128::from_le_bytes(*Uuid::new_v4().as_bytes());

    let mut order_no = String::with_capacity(ORDER_NO_MAX_LEN);
    order_no.push_str(ORDER_NO_PREFIX);
    order_no.push_str(&to_base36(u128::from(millis)));
    let suffix = to_base36(random % 36_u128.pow(ORDER_NO_SUFFIX_LEN as u32));
    for _ in suffix.len()..ORDER_NO_SUFFIX_LEN {
        order_no.push('0');
    }
    order_no.push_str(&suffix);
    order_no.truncate(ORDER_NO_MAX_LEN);
    order_no
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
