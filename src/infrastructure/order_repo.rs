use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrder, Order, OrderStatus, PaymentLogEntry, PaymentStatus, SettleOutcome, Settlement,
    VariantRecord,
};
use crate::domain::ports::{OrderStore, VariantCatalog};
use crate::schema::{order_items, orders, payment_logs, product_variants};

use super::models::{
    NewOrderItemRow, NewOrderRow, NewPaymentLogRow, NewVariantRow, OrderItemRow, OrderRow,
    VariantRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Adds a purchasable variant. Catalog management lives elsewhere; this
    /// exists for seeding and tests.
    pub fn seed_variant(
        &self,
        product_id: Uuid,
        label: &str,
        price: &BigDecimal,
        stock: i32,
    ) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;
        let id = Uuid::new_v4();
        diesel::insert_into(product_variants::table)
            .values(&NewVariantRow {
                id,
                product_id,
                label,
                price,
                stock,
            })
            .execute(&mut conn)?;
        Ok(id)
    }

    pub fn stock_of(&self, variant_id: Uuid) -> Result<Option<i32>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(product_variants::table
            .filter(product_variants::id.eq(variant_id))
            .select(product_variants::stock)
            .first(&mut conn)
            .optional()?)
    }
}

impl VariantCatalog for DieselOrderStore {
    fn find_variants(&self, ids: &[Uuid]) -> Result<Vec<VariantRecord>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = product_variants::table
            .filter(product_variants::id.eq_any(ids.to_vec()))
            .select(VariantRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(VariantRecord::from).collect())
    }
}

impl OrderStore for DieselOrderStore {
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_id = Uuid::new_v4();
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    order_no: &order.order_no,
                    user_id: order.user_id,
                    email: &order.email,
                    total: &order.total,
                    status: OrderStatus::Pending.as_str(),
                    payment_status: PaymentStatus::Unpaid.as_str(),
                    payment_method: order.payment_method.as_str(),
                })
                .execute(conn)?;

            // 2. Insert the item snapshots
            let items: Vec<NewOrderItemRow> = order
                .lines
                .iter()
                .zip(1..)
                .map(|(l, line_no)| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    variant_id: l.variant_id,
                    product_name: &l.product_name,
                    variant_label: &l.variant_label,
                    price: &l.price,
                    quantity: l.quantity,
                    line_no,
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(conn)?;

            // 3. Take stock. The guarded UPDATE re-checks the count under the
            //    row lock; variants are visited in id order so concurrent
            //    checkouts lock rows in the same sequence.
            let mut demand: BTreeMap<Uuid, i32> = BTreeMap::new();
            for line in &order.lines {
                *demand.entry(line.variant_id).or_insert(0) += line.quantity;
            }
            for (variant_id, quantity) in demand {
                let updated = diesel::update(
                    product_variants::table
                        .filter(product_variants::id.eq(variant_id))
                        .filter(product_variants::stock.ge(quantity)),
                )
                .set((
                    product_variants::stock.eq(product_variants::stock - quantity),
                    product_variants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

                if updated == 0 {
                    return Err(DomainError::StockRaceLost { variant_id });
                }
            }

            Ok(order_id)
        })
    }

    fn find_by_order_no(&self, order_no: &str) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::order_no.eq(order_no))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::line_no.asc())
            .load(&mut conn)?;

        order.into_order(items).map(Some)
    }

    fn settle(&self, settlement: &Settlement) -> Result<SettleOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serialises concurrent deliveries for the same order.
            let order = orders::table
                .filter(orders::order_no.eq(&settlement.order_no))
                .select(OrderRow::as_select())
                .for_update()
                .get_result(conn)
                .optional()?;

            let Some(order) = order else {
                return Ok(SettleOutcome::NotFound);
            };
            if order.payment_status == PaymentStatus::Paid.as_str() {
                return Ok(SettleOutcome::AlreadyPaid { order_id: order.id });
            }

            let target = orders::table.filter(orders::id.eq(order.id));
            let payment_status = if settlement.succeeded {
                diesel::update(target)
                    .set((
                        orders::payment_status.eq(PaymentStatus::Paid.as_str()),
                        orders::status.eq(OrderStatus::Completed.as_str()),
                        orders::gateway_trade_no.eq(&settlement.trade_no),
                        orders::payment_date.eq(settlement.payment_date),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                PaymentStatus::Paid
            } else {
                diesel::update(target)
                    .set((
                        orders::payment_status.eq(PaymentStatus::Failed.as_str()),
                        orders::gateway_trade_no.eq(&settlement.trade_no),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                PaymentStatus::Failed
            };

            Ok(SettleOutcome::Applied {
                order_id: order.id,
                payment_status,
            })
        })
    }

    fn append_log(&self, entry: &PaymentLogEntry) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(payment_logs::table)
            .values(&NewPaymentLogRow {
                id: Uuid::new_v4(),
                order_id: entry.order_id,
                order_no: entry.order_no.as_deref(),
                action: entry.action.as_str(),
                raw_data: &entry.raw_data,
            })
            .execute(&mut conn)?;
        Ok(())
    }
}
