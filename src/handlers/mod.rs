pub mod callback;
pub mod checkout;
pub mod orders;

use std::sync::Arc;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::application::{CallbackService, CheckoutService};
use crate::config::GatewayConfig;
use crate::domain::ports::OrderStore;
use crate::errors::AppError;

/// Shared per-worker state. Services hold the store behind a trait object so
/// the Diesel store and test doubles plug in the same way.
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub checkout: CheckoutService<Arc<dyn OrderStore>>,
    pub callback: CallbackService<Arc<dyn OrderStore>>,
}

impl AppState {
    pub fn new(store: Arc<dyn OrderStore>, gateway: GatewayConfig) -> Self {
        Self {
            callback: CallbackService::new(store.clone(), &gateway),
            checkout: CheckoutService::new(store.clone(), gateway),
            store,
        }
    }
}

/// Registers every route of the storefront API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/checkout")
            .route(web::post().to(checkout::checkout))
            .route(web::method(actix_web::http::Method::OPTIONS).to(checkout::preflight)),
    )
    .route(
        "/payments/callback",
        web::post().to(callback::payment_callback),
    )
    .route("/orders/{order_no}", web::get().to(orders::get_order));
}

/// Reports undecodable JSON bodies as `400 {"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error)
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid request body: {err}")).into()
}
