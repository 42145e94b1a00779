use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unknown variant {variant_id} ({product_name})")]
    UnknownVariant { variant_id: Uuid, product_name: String },
    #[error("Insufficient stock for {product_name} ({variant_label}): {remaining} left")]
    InsufficientStock {
        product_name: String,
        variant_label: String,
        remaining: i32,
    },
    #[error("Stock for variant {variant_id} changed before the order was written")]
    StockRaceLost { variant_id: Uuid },
    #[error("Order not found")]
    OrderNotFound,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = BTreeSet::new();
        collect_messages(&errors, &mut messages);
        DomainError::InvalidRequest(messages.into_iter().collect::<Vec<_>>().join("; "))
    }
}

fn collect_messages(errors: &ValidationErrors, out: &mut BTreeSet<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    out.insert(match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{field} is invalid"),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}
