//! Settlement of asynchronous gateway notifications.
//!
//! The gateway re-delivers a notification until it reads `1|OK`, so every
//! path through [`CallbackService::handle`] ends in an acknowledgment and
//! repeated deliveries for a paid order change nothing.

use chrono::Utc;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::GatewayConfig;
use crate::domain::order::{LogAction, PaymentLogEntry, SettleOutcome, Settlement};
use crate::domain::ports::OrderStore;
use crate::gateway::request::parse_gateway_date;
use crate::gateway::{CheckMacCodec, GatewayParams};

/// `RtnCode` value the gateway sends for a successful payment.
const SUCCESS_RTN_CODE: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAck {
    Ok,
    SignatureInvalid,
    OrderNotFound,
    Error,
}

impl CallbackAck {
    /// Plain-text body the gateway expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackAck::Ok => "1|OK",
            CallbackAck::SignatureInvalid => "0|CheckMacValue Error",
            CallbackAck::OrderNotFound => "0|OrderNotFound",
            CallbackAck::Error => "0|Error",
        }
    }
}

pub struct CallbackService<S> {
    store: S,
    codec: CheckMacCodec,
}

impl<S: OrderStore> CallbackService<S> {
    pub fn new(store: S, gateway: &GatewayConfig) -> Self {
        Self {
            store,
            codec: gateway.codec(),
        }
    }

    /// Processes one raw `application/x-www-form-urlencoded` notification body.
    pub fn handle(&self, body: &[u8]) -> CallbackAck {
        let params: GatewayParams = form_urlencoded::parse(body).into_owned().collect();
        log::info!("Gateway callback received: {:?}", params);

        if !self.codec.verify_params(&params) {
            log::warn!(
                "CheckMacValue verification failed for trade no {:?}",
                params.get("MerchantTradeNo")
            );
            self.record(None, &params);
            return CallbackAck::SignatureInvalid;
        }

        let Some(order_no) = params.get("MerchantTradeNo").filter(|v| !v.is_empty()) else {
            log::warn!("Signed callback without MerchantTradeNo");
            self.record(None, &params);
            return CallbackAck::OrderNotFound;
        };

        let settlement = Settlement {
            order_no: order_no.clone(),
            succeeded: params.get("RtnCode").map(String::as_str) == Some(SUCCESS_RTN_CODE),
            trade_no: params.get("TradeNo").cloned().unwrap_or_default(),
            payment_date: params
                .get("PaymentDate")
                .and_then(|d| parse_gateway_date(d))
                .unwrap_or_else(Utc::now),
        };

        match self.store.settle(&settlement) {
            Ok(SettleOutcome::NotFound) => {
                log::warn!("Callback for unknown order {}", order_no);
                self.record(None, &params);
                CallbackAck::OrderNotFound
            }
            Ok(SettleOutcome::AlreadyPaid { order_id }) => {
                log::info!("Order {} already paid; duplicate callback ignored", order_no);
                self.record(Some(order_id), &params);
                CallbackAck::Ok
            }
            Ok(SettleOutcome::Applied {
                order_id,
                payment_status,
            }) => {
                log::info!(
                    "Order {} marked {} (trade no {}, RtnCode {:?})",
                    order_no,
                    payment_status,
                    settlement.trade_no,
                    params.get("RtnCode")
                );
                self.record(Some(order_id), &params);
                CallbackAck::Ok
            }
            Err(e) => {
                log::error!("Failed to settle order {}: {}", order_no, e);
                CallbackAck::Error
            }
        }
    }

    /// Appends the raw payload to the audit trail. Failures are logged only.
    fn record(&self, order_id: Option<uuid::Uuid>, params: &GatewayParams) {
        let entry = PaymentLogEntry {
            order_id,
            order_no: params.get("MerchantTradeNo").cloned(),
            action: LogAction::Callback,
            raw_data: Value::Object(
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        };
        if let Err(e) = self.store.append_log(&entry) {
            log::warn!("Failed to record callback log: {}", e);
        }
    }
}
