use std::sync::Arc;

use uuid::Uuid;

use super::errors::DomainError;
use super::order::{NewOrder, Order, PaymentLogEntry, SettleOutcome, Settlement, VariantRecord};

/// Read access to authoritative variant prices and stock.
pub trait VariantCatalog {
    /// Returns the records that exist among `ids`; unknown ids are simply absent.
    fn find_variants(&self, ids: &[Uuid]) -> Result<Vec<VariantRecord>, DomainError>;
}

pub trait OrderStore: VariantCatalog + Send + Sync + 'static {
    /// Inserts the order, its items and decrements stock as one unit.
    /// Fails with `StockRaceLost` if any variant no longer has enough stock.
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError>;

    fn find_by_order_no(&self, order_no: &str) -> Result<Option<Order>, DomainError>;

    /// Applies a gateway result unless the order is already paid. The paid
    /// check and the update are atomic per order.
    fn settle(&self, settlement: &Settlement) -> Result<SettleOutcome, DomainError>;

    fn append_log(&self, entry: &PaymentLogEntry) -> Result<(), DomainError>;
}

impl<T: VariantCatalog + ?Sized> VariantCatalog for Arc<T> {
    fn find_variants(&self, ids: &[Uuid]) -> Result<Vec<VariantRecord>, DomainError> {
        (**self).find_variants(ids)
    }
}

impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError> {
        (**self).create_order(order)
    }

    fn find_by_order_no(&self, order_no: &str) -> Result<Option<Order>, DomainError> {
        (**self).find_by_order_no(order_no)
    }

    fn settle(&self, settlement: &Settlement) -> Result<SettleOutcome, DomainError> {
        (**self).settle(settlement)
    }

    fn append_log(&self, entry: &PaymentLogEntry) -> Result<(), DomainError> {
        (**self).append_log(entry)
    }
}
