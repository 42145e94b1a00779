use actix_web::{web, HttpResponse};

use super::AppState;
use crate::application::CallbackAck;

/// POST /payments/callback
///
/// Server-to-server notification from the gateway. Always answers 200 with a
/// plain-text acknowledgment; the gateway retries anything but `1|OK`.
#[utoipa::path(
    post,
    path = "/payments/callback",
    request_body(
        content = String,
        description = "Gateway notification fields, signed with CheckMacValue",
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "`1|OK` or `0|<reason>`", body = String, content_type = "text/plain"),
    ),
    tag = "payments"
)]
pub async fn payment_callback(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let ack = web::block(move || state.callback.handle(&body))
        .await
        .unwrap_or_else(|e| {
            log::error!("Callback worker failed: {}", e);
            CallbackAck::Error
        });

    HttpResponse::Ok()
        .content_type("text/plain")
        .body(ack.as_str())
}
