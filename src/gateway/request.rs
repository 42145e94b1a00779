use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use url::form_urlencoded;

use super::check_mac::{CheckMacCodec, GatewayParams, CHECK_MAC_FIELD};
use crate::config::GatewayConfig;
use crate::domain::order::{PaymentMethod, VerifiedLine};

/// The gateway reads and writes timestamps in Taiwan local time (UTC+8).
const GATEWAY_UTC_OFFSET_HOURS: i64 = 8;
const GATEWAY_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub fn format_trade_date(at: DateTime<Utc>) -> String {
    (at + Duration::hours(GATEWAY_UTC_OFFSET_HOURS))
        .format(GATEWAY_DATE_FORMAT)
        .to_string()
}

pub fn parse_gateway_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), GATEWAY_DATE_FORMAT)
        .ok()
        .map(|local| (local - Duration::hours(GATEWAY_UTC_OFFSET_HOURS)).and_utc())
}

/// `"{name} {label} x{quantity}"` per line, joined with `#`.
pub fn item_name(lines: &[VerifiedLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} {} x{}", l.product_name, l.variant_label, l.quantity))
        .collect::<Vec<_>>()
        .join("#")
}

/// Total in whole currency units, half rounded up.
pub fn total_amount(total: &BigDecimal) -> String {
    let rounded = total.with_scale_round(0, RoundingMode::HalfUp);
    rounded
        .to_i64()
        .map(|n| n.to_string())
        .unwrap_or_else(|| rounded.to_string())
}

/// Signed parameter set plus the endpoint the browser must POST it to.
#[derive(Debug, Clone)]
pub struct GatewayRedirect {
    pub action_url: String,
    pub params: GatewayParams,
}

impl GatewayRedirect {
    /// Auto-submitting HTML form for the buyer's browser.
    pub fn to_html(&self) -> String {
        let inputs = self
            .params
            .iter()
            .map(|(k, v)| {
                format!(
                    r#"<input type="hidden" name="{}" value="{}" />"#,
                    escape_attr(k),
                    escape_attr(v)
                )
            })
            .collect::<Vec<_>>()
            .join("\n      ");

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Redirecting to payment...</title>
</head>
<body>
  <form id="gateway-form" method="POST" action="{}">
      {}
  </form>
  <script>document.getElementById('gateway-form').submit();</script>
</body>
</html>"#,
            escape_attr(&self.action_url),
            inputs
        )
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds and signs the checkout request for one freshly written order.
pub fn build_payment_request(
    config: &GatewayConfig,
    codec: &CheckMacCodec,
    order_no: &str,
    lines: &[VerifiedLine],
    total: &BigDecimal,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> GatewayRedirect {
    let trade_desc: String = form_urlencoded::byte_serialize(config.store_name.as_bytes()).collect();

    let mut params = GatewayParams::new();
    let mut put = |k: &str, v: String| {
        params.insert(k.to_string(), v);
    };
    put("MerchantID", config.merchant_id.clone());
    put("MerchantTradeNo", order_no.to_string());
    put("MerchantTradeDate", format_trade_date(now));
    put("PaymentType", "aio".to_string());
    put("TotalAmount", total_amount(total));
    put("TradeDesc", trade_desc);
    put("ItemName", item_name(lines));
    put("ReturnURL", config.callback_url.clone());
    put(
        "OrderResultURL",
        format!(
            "{}/checkout/result?order_no={}",
            config.frontend_url.trim_end_matches('/'),
            order_no
        ),
    );
    put("ChoosePayment", payment_method.as_str().to_string());
    put("EncryptType", "1".to_string());
    put("NeedExtraPaidInfo", "Y".to_string());

    let check_mac = codec.sign(&params);
    params.insert(CHECK_MAC_FIELD.to_string(), check_mac);

    GatewayRedirect {
        action_url: config.api_url.clone(),
        params,
    }
}
