//! In-memory `OrderStore` used by unit tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrder, Order, OrderItem, OrderStatus, PaymentLogEntry, PaymentStatus, SettleOutcome,
    Settlement, VariantRecord,
};
use crate::domain::ports::{OrderStore, VariantCatalog};

#[derive(Default)]
struct Inner {
    variants: HashMap<Uuid, VariantRecord>,
    orders: Vec<Order>,
    logs: Vec<PaymentLogEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_logs: AtomicBool,
    fail_writes: AtomicBool,
    reported_stock: Mutex<Option<i32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variant(&self, price: &str, stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().variants.insert(
            id,
            VariantRecord {
                id,
                product_id: Uuid::new_v4(),
                price: BigDecimal::from_str(price).expect("valid decimal"),
                stock,
            },
        );
        id
    }

    /// Makes `find_variants` report `stock` regardless of the real count, as a
    /// concurrent checkout would leave a validated view stale.
    pub fn report_stale_stock(&self, stock: i32) {
        *self.reported_stock.lock().unwrap() = Some(stock);
    }

    pub fn stock_of(&self, variant_id: Uuid) -> i32 {
        self.inner.lock().unwrap().variants[&variant_id].stock
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    pub fn logs(&self) -> Vec<PaymentLogEntry> {
        self.inner.lock().unwrap().logs.clone()
    }

    pub fn fail_logs(&self) {
        self.fail_logs.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl VariantCatalog for MemoryStore {
    fn find_variants(&self, ids: &[Uuid]) -> Result<Vec<VariantRecord>, DomainError> {
        let reported = *self.reported_stock.lock().unwrap();
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.variants.get(id).cloned())
            .map(|mut v| {
                if let Some(stock) = reported {
                    v.stock = stock;
                }
                v
            })
            .collect())
    }
}

impl OrderStore for MemoryStore {
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("store unavailable".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();

        let mut demand: HashMap<Uuid, i32> = HashMap::new();
        for line in &order.lines {
            *demand.entry(line.variant_id).or_insert(0) += line.quantity;
        }
        for (variant_id, wanted) in &demand {
            let stock = inner.variants.get(variant_id).map_or(0, |v| v.stock);
            if stock < *wanted {
                return Err(DomainError::StockRaceLost {
                    variant_id: *variant_id,
                });
            }
        }
        for (variant_id, wanted) in demand {
            if let Some(v) = inner.variants.get_mut(&variant_id) {
                v.stock -= wanted;
            }
        }

        let id = Uuid::new_v4();
        inner.orders.push(Order {
            id,
            order_no: order.order_no.clone(),
            user_id: order.user_id,
            email: order.email.clone(),
            total: order.total.clone(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: order.payment_method,
            gateway_trade_no: None,
            payment_date: None,
            created_at: Utc::now(),
            items: order
                .lines
                .iter()
                .map(|l| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: l.product_id,
                    variant_id: l.variant_id,
                    product_name: l.product_name.clone(),
                    variant_label: l.variant_label.clone(),
                    price: l.price.clone(),
                    quantity: l.quantity,
                })
                .collect(),
        });
        Ok(id)
    }

    fn find_by_order_no(&self, order_no: &str) -> Result<Option<Order>, DomainError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.orders.iter().find(|o| o.order_no == order_no).cloned())
    }

    fn settle(&self, settlement: &Settlement) -> Result<SettleOutcome, DomainError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(order) = inner
            .orders
            .iter_mut()
            .find(|o| o.order_no == settlement.order_no)
        else {
            return Ok(SettleOutcome::NotFound);
        };
        if order.payment_status == PaymentStatus::Paid {
            return Ok(SettleOutcome::AlreadyPaid { order_id: order.id });
        }
        order.gateway_trade_no = Some(settlement.trade_no.clone());
        if settlement.succeeded {
            order.payment_status = PaymentStatus::Paid;
            order.status = OrderStatus::Completed;
            order.payment_date = Some(settlement.payment_date);
        } else {
            order.payment_status = PaymentStatus::Failed;
        }
        Ok(SettleOutcome::Applied {
            order_id: order.id,
            payment_status: order.payment_status,
        })
    }

    fn append_log(&self, entry: &PaymentLogEntry) -> Result<(), DomainError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("payment_logs unavailable".to_string()));
        }
        self.inner.lock().unwrap().logs.push(entry.clone());
        Ok(())
    }
}

/// Form-encoded gateway notification for `order_no`, signed with `gateway`'s keys.
pub fn signed_callback(
    gateway: &crate::config::GatewayConfig,
    order_no: &str,
    rtn_code: &str,
    trade_no: &str,
) -> String {
    let mut params = crate::gateway::GatewayParams::new();
    for (k, v) in [
        ("MerchantID", gateway.merchant_id.as_str()),
        ("MerchantTradeNo", order_no),
        ("RtnCode", rtn_code),
        ("RtnMsg", "Succeeded"),
        ("TradeNo", trade_no),
        ("TradeAmt", "1000"),
        ("PaymentDate", "2024/06/01 12:34:56"),
        ("PaymentType", "Credit_CreditCard"),
        ("SimulatePaid", "0"),
    ] {
        params.insert(k.to_string(), v.to_string());
    }
    let mac = gateway.codec().sign(&params);
    params.insert(crate::gateway::CHECK_MAC_FIELD.to_string(), mac);
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}
