use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidRequest(msg) => AppError::BadRequest(msg),
            DomainError::UnknownVariant { product_name, .. } => {
                AppError::BadRequest(format!("Product not found: {product_name}"))
            }
            DomainError::InsufficientStock {
                product_name,
                variant_label,
                remaining,
            } => AppError::BadRequest(format!(
                "Insufficient stock: {product_name} ({variant_label}), {remaining} left"
            )),
            DomainError::StockRaceLost { .. } => AppError::BadRequest(
                "Stock changed while placing your order, please recheck your cart".to_string(),
            ),
            DomainError::OrderNotFound => AppError::NotFound,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": msg
            })),
            AppError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}
