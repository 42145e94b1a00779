use std::future::Future;
use std::time::Duration;

use crate::config::PollingConfig;
use crate::domain::order::{Order, PaymentStatus};

/// Anything that reports an order's payment status.
pub trait PaymentTracked {
    fn payment_status(&self) -> PaymentStatus;
}

impl PaymentTracked for Order {
    fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Paid(T),
    Failed(T),
    /// The attempt ceiling was reached while the order was still unpaid.
    StillPending(T),
    NotFound,
}

/// Re-fetches an order while it is unpaid, waiting a fixed interval between
/// fetches and giving up after a fixed number of retries.
#[derive(Debug, Clone, Copy)]
pub struct ResultPoller {
    interval: Duration,
    max_attempts: u32,
}

impl ResultPoller {
    pub fn new(config: PollingConfig) -> Self {
        Self {
            interval: config.interval,
            max_attempts: config.max_attempts,
        }
    }

    /// Runs `fetch` until the order is settled, missing, or out of retries.
    /// Dropping the returned future stops polling.
    pub async fn poll<T, E, F, Fut>(&self, mut fetch: F) -> Result<PollOutcome<T>, E>
    where
        T: PaymentTracked,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let mut attempts = 0;
        loop {
            let Some(order) = fetch().await? else {
                return Ok(PollOutcome::NotFound);
            };
            match order.payment_status() {
                PaymentStatus::Paid => return Ok(PollOutcome::Paid(order)),
                PaymentStatus::Failed => return Ok(PollOutcome::Failed(order)),
                PaymentStatus::Unpaid if attempts < self.max_attempts => {
                    attempts += 1;
                    log::debug!("Order still unpaid; retry {} of {}", attempts, self.max_attempts);
                    tokio::time::sleep(self.interval).await;
                }
                PaymentStatus::Unpaid => return Ok(PollOutcome::StillPending(order)),
            }
        }
    }
}

impl Default for ResultPoller {
    fn default() -> Self {
        Self::new(PollingConfig::default())
    }
}
