use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::AppState;
use crate::domain::order::{CheckoutLine, CheckoutRequest, PaymentMethod};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_label: String,
    /// Price shown to the buyer. Ignored for billing.
    #[serde(default)]
    pub price: Option<f64>,
    pub quantity: i32,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequestBody {
    #[serde(default)]
    pub items: Vec<CheckoutItemRequest>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    /// Auto-submitting form that forwards the browser to the gateway.
    pub html: String,
    pub order_no: String,
}

impl CheckoutRequestBody {
    fn into_domain(self) -> Result<CheckoutRequest, AppError> {
        if self.items.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_string()));
        }
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

        let lines = self
            .items
            .into_iter()
            .map(|item| CheckoutLine {
                product_id: item.product_id,
                variant_id: item.variant_id,
                product_name: item.product_name,
                variant_label: item.variant_label,
                claimed_price: item
                    .price
                    .and_then(|p| BigDecimal::from_str(&p.to_string()).ok()),
                quantity: item.quantity,
            })
            .collect();

        Ok(CheckoutRequest {
            lines,
            payment_method: self.payment_method,
            email,
            user_id: self.user_id,
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /checkout
///
/// Re-prices the cart from the catalog, writes the order and its stock
/// decrement in one transaction, and returns the signed gateway form.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequestBody,
    responses(
        (status = 200, description = "Order created; submit `html` to reach the gateway", body = CheckoutResponse),
        (status = 400, description = "Invalid cart, unknown item or insufficient stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequestBody>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_domain()?;

    let outcome = web::block(move || state.checkout.checkout(request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        html: outcome.redirect.to_html(),
        order_no: outcome.order_no,
    }))
}

/// OPTIONS /checkout
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::config::GatewayConfig;
    use crate::handlers::{configure, json_config, AppState};
    use crate::testing::MemoryStore;

    fn state(store: Arc<MemoryStore>) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            store,
            GatewayConfig::sandbox("http://localhost:8080/payments/callback"),
        ))
    }

    fn cart(variant_id: Uuid, quantity: i32, price: f64) -> Value {
        json!({
            "items": [{
                "product_id": Uuid::new_v4(),
                "variant_id": variant_id,
                "product_name": "Steam Wallet",
                "variant_label": "NT$500",
                "price": price,
                "quantity": quantity,
                "image": "https://cdn.example/steam.png"
            }],
            "payment_method": "Credit",
            "email": "buyer@example.com",
            "user_id": null
        })
    }

    #[actix_web::test]
    async fn checkout_returns_form_and_order_no() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 5);
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(cart(v1, 2, 999.0))
            .to_request();
        let resp: CheckoutResponse = test::call_and_read_body_json(&app, req).await;

        assert!(resp.order_no.starts_with("ORD"));
        assert!(resp.html.contains(r#"name="TotalAmount" value="1000""#));
        assert!(resp.html.contains(r#"name="CheckMacValue""#));
        assert_eq!(store.stock_of(v1), 3);
    }

    #[actix_web::test]
    async fn empty_cart_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(json!({ "items": [], "payment_method": "ATM", "email": "a@b.co" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Cart is empty");
    }

    #[actix_web::test]
    async fn missing_email_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 5);
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let mut body = cart(v1, 1, 500.0);
        body["email"] = Value::Null;
        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.order_count(), 0);
    }

    #[actix_web::test]
    async fn insufficient_stock_is_400_and_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 1);
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(cart(v1, 2, 500.0))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Insufficient stock: Steam Wallet (NT$500), 1 left");
        assert_eq!(store.stock_of(v1), 1);
        assert_eq!(store.order_count(), 0);
    }

    #[actix_web::test]
    async fn oversized_snapshot_fields_are_400_and_change_nothing() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 5);
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let mut body = cart(v1, 1, 500.0);
        body["items"][0]["product_name"] = Value::String("n".repeat(5000));
        body["items"][0]["variant_label"] = Value::String("l".repeat(5000));
        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("product name"), "{message}");
        assert!(message.contains("variant label"), "{message}");
        assert_eq!(store.stock_of(v1), 5);
        assert_eq!(store.order_count(), 0);
        assert!(store.logs().is_empty());
    }

    #[actix_web::test]
    async fn malformed_email_is_400() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 5);
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let mut body = cart(v1, 1, 500.0);
        body["email"] = Value::String("a@b..com".to_string());
        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "a valid email address is required");
        assert_eq!(store.order_count(), 0);
    }

    #[actix_web::test]
    async fn malformed_json_is_400_with_error_field() {
        let store = Arc::new(MemoryStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state(store))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"items": [{"variant_id": "not-a-uuid"}], "payment_method": "Credit"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn store_failure_is_generic_500() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.add_variant("500", 5);
        store.fail_writes();
        let app = test::init_service(
            App::new()
                .app_data(state(store))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(cart(v1, 1, 500.0))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn preflight_answers_ok() {
        let store = Arc::new(MemoryStore::new());
        let app = test::init_service(App::new().app_data(state(store)).configure(configure)).await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/checkout")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
