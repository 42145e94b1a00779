//! Server-side re-validation of a checkout.
//!
//! Client-submitted prices are never trusted: every line is priced from the
//! catalog and the order total is computed here. Quantities are taken from
//! the client but checked against the stock the catalog reports.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use super::errors::DomainError;
use super::order::{CheckoutRequest, VariantRecord, VerifiedLine, VerifiedOrder};
use super::ports::VariantCatalog;

pub fn validate_checkout<C>(
    catalog: &C,
    request: &CheckoutRequest,
) -> Result<VerifiedOrder, DomainError>
where
    C: VariantCatalog + ?Sized,
{
    if request.lines.is_empty() {
        return Err(DomainError::InvalidRequest("cart is empty".to_string()));
    }
    request.validate()?;

    let mut ids: Vec<Uuid> = request.lines.iter().map(|l| l.variant_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let variants: HashMap<Uuid, VariantRecord> = catalog
        .find_variants(&ids)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    // Demand is accumulated per variant so that the same variant split over
    // several lines cannot exceed stock.
    let mut demand: HashMap<Uuid, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(request.lines.len());

    for line in &request.lines {
        let Some(variant) = variants.get(&line.variant_id) else {
            return Err(DomainError::UnknownVariant {
                variant_id: line.variant_id,
                product_name: line.product_name.clone(),
            });
        };

        let wanted = demand.entry(variant.id).or_insert(0);
        *wanted += i64::from(line.quantity);
        if *wanted > i64::from(variant.stock) {
            return Err(DomainError::InsufficientStock {
                product_name: line.product_name.clone(),
                variant_label: line.variant_label.clone(),
                remaining: variant.stock,
            });
        }

        if let Some(claimed) = &line.claimed_price {
            if claimed != &variant.price {
                log::warn!(
                    "Client price {} for variant {} differs from catalog price {}",
                    claimed,
                    variant.id,
                    variant.price
                );
            }
        }

        lines.push(VerifiedLine {
            product_id: variant.product_id,
            variant_id: variant.id,
            product_name: line.product_name.clone(),
            variant_label: line.variant_label.clone(),
            price: variant.price.clone(),
            quantity: line.quantity,
        });
    }

    let total = lines
        .iter()
        .fold(BigDecimal::from(0), |sum, l| sum + l.line_total());

    Ok(VerifiedOrder { lines, total })
}
