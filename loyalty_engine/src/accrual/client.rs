use std::time::Duration;

use chrono::{DateTime, Utc};
use log::*;
use lpg_common::Points;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Deserialize;

use super::limiter::AdaptiveLimiter;
use crate::{
    db_types::{OrderNumber, OrderStatus},
    traits::{AccrualApi, AccrualApiError, AccrualOutcome},
};

// header names are kept lowercase so they double as `HeaderName` literals; lookups are case-insensitive anyway
const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
/// Back-off applied when a 429 carries no (or an unreadable) `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// HTTP client for the external accrual service.
///
/// A single operation, `GET {base}/api/orders/{number}`, surfaced as a typed [`AccrualOutcome`]. Every call first
/// waits on the shared [`AdaptiveLimiter`], and every response is drained so the connection returns to the pool.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    client: Client,
    limiter: AdaptiveLimiter,
}

#[derive(Debug, Clone, Deserialize)]
struct OrderAccrualResponse {
    order: String,
    status: String,
    #[serde(default)]
    accrual: Option<Points>,
}

impl AccrualClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client, limiter: AdaptiveLimiter::new() })
    }

    pub async fn get_order_accrual(&self, number: &OrderNumber) -> Result<AccrualOutcome, AccrualApiError> {
        self.limiter.acquire().await;
        let url = format!("{}/api/orders/{number}", self.base_url);
        trace!("🎯️ GET {url}");
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("🎯️ Request to the accrual service failed: {e}");
                return Ok(AccrualOutcome::Unavailable);
            },
        };
        if let Some((limit, reset)) = parse_rate_hints(response.headers()) {
            self.limiter.apply_hints(limit, reset);
        }
        match response.status() {
            StatusCode::OK => {
                let body: OrderAccrualResponse = response
                    .json()
                    .await
                    .map_err(|e| AccrualApiError::Protocol(format!("undecodable response body: {e}")))?;
                interpret_evaluation(number, body)
            },
            StatusCode::NO_CONTENT => {
                debug!("🎯️ Order [{number}] is not registered with the accrual service");
                Ok(AccrualOutcome::NotRegistered)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = parse_retry_after(response.headers());
                warn!("🎯️ Accrual service rate limit hit; blocking outbound calls for {}s", retry_after.as_secs());
                self.limiter.block_for(retry_after);
                let _ = response.bytes().await;
                Ok(AccrualOutcome::RateLimited { retry_after })
            },
            status => {
                warn!("🎯️ Accrual service returned {status} for order [{number}]");
                let _ = response.bytes().await;
                Ok(AccrualOutcome::Unavailable)
            },
        }
    }
}

impl AccrualApi for AccrualClient {
    async fn order_accrual(&self, number: &OrderNumber) -> Result<AccrualOutcome, AccrualApiError> {
        self.get_order_accrual(number).await
    }
}

fn interpret_evaluation(number: &OrderNumber, body: OrderAccrualResponse) -> Result<AccrualOutcome, AccrualApiError> {
    if body.order != number.as_str() {
        debug!("🎯️ Accrual response names order {}, expected [{number}]", body.order);
    }
    let status = body.status.parse::<OrderStatus>().map_err(|e| AccrualApiError::Protocol(e.to_string()))?;
    if status == OrderStatus::New {
        return Err(AccrualApiError::Protocol("Invalid order status: NEW".to_string()));
    }
    // The accrual value only means something once the service has fully processed the receipt.
    let accrual = if status == OrderStatus::Processed { body.accrual.unwrap_or_default() } else { Points::default() };
    if accrual < Points::default() {
        return Err(AccrualApiError::Protocol(format!("negative accrual {accrual} for order [{number}]")));
    }
    Ok(AccrualOutcome::Evaluated { status, accrual })
}

/// `Retry-After` is either integer seconds or an HTTP-date; anything else falls back to the 60 s default.
fn parse_retry_after(headers: &HeaderMap) -> Duration {
    let Some(value) = headers.get(reqwest::header::RETRY_AFTER).and_then(|v| v.to_str().ok()) else {
        return DEFAULT_RETRY_AFTER;
    };
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }
    if let Ok(when) = DateTime::parse_from_rfc2822(value) {
        return (when.with_timezone(&Utc) - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    }
    DEFAULT_RETRY_AFTER
}

fn parse_rate_hints(headers: &HeaderMap) -> Option<(u32, i64)> {
    let limit = headers.get(RATE_LIMIT_LIMIT_HEADER)?.to_str().ok()?.trim().parse::<u32>().ok()?;
    let reset = headers.get(RATE_LIMIT_RESET_HEADER)?.to_str().ok()?.trim().parse::<i64>().ok()?;
    Some((limit, reset))
}
