//! HTTP client for the storefront API.
//!
//! Used by the result page flow: after the gateway redirects the buyer back,
//! the order is re-read until the asynchronous notification has settled it.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::application::{PollOutcome, ResultPoller};
use crate::handlers::checkout::{CheckoutRequestBody, CheckoutResponse};
use crate::handlers::orders::OrderResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
    poller: ResultPoller,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>, poller: ResultPoller) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poller,
        })
    }

    pub async fn checkout(
        &self,
        request: &CheckoutRequestBody,
    ) -> Result<CheckoutResponse, ClientError> {
        let resp = self
            .http
            .post(format!("{}/checkout", self.base_url))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// `Ok(None)` when the server does not know `order_no`.
    pub async fn fetch_order(&self, order_no: &str) -> Result<Option<OrderResponse>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/orders/{}", self.base_url, order_no))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(resp.json().await?)),
            _ => Err(rejected(resp).await),
        }
    }

    /// Polls the order until the gateway notification has been applied or
    /// the poller's attempt ceiling is reached.
    pub async fn await_payment(
        &self,
        order_no: &str,
    ) -> Result<PollOutcome<OrderResponse>, ClientError> {
        self.poller.poll(|| self.fetch_order(order_no)).await
    }
}

async fn rejected(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    ClientError::Rejected { status, message }
}
