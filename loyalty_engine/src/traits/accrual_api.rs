use std::{future::Future, time::Duration};

use lpg_common::Points;
use thiserror::Error;

use crate::db_types::{OrderNumber, OrderStatus};

/// The outbound accrual-service seam.
///
/// The production implementation is [`crate::accrual::AccrualClient`]; the worker and the order-flow tests substitute
/// their own.
#[allow(async_fn_in_trait)]
pub trait AccrualApi {
    /// Asks the accrual service how many points the given receipt is worth.
    fn order_accrual(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualOutcome, AccrualApiError>> + Send;
}

/// Every way an accrual lookup can resolve, short of a protocol violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// The service evaluated the receipt. `accrual` is zero unless `status` is `PROCESSED`.
    Evaluated { status: OrderStatus, accrual: Points },
    /// The service asked us to back off. The shared limiter has already been blocked for `retry_after`.
    RateLimited { retry_after: Duration },
    /// The service does not know this receipt number (HTTP 204).
    NotRegistered,
    /// Transport failure or an unexpected response status.
    Unavailable,
}

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize the accrual client: {0}")]
    Initialization(String),
    #[error("The accrual service broke protocol: {0}")]
    Protocol(String),
}
