use std::future::Future;

use lpg_common::Points;
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderNumber, OrderStatus};

/// Behaviour for order persistence, the claim-for-processing lease, and transactional settlement.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Inserts a brand-new order in `NEW` status. Fails with [`OrderApiError::AlreadyExists`] if the number is taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderApiError>;

    /// Fetches the order with the given number, or `None`.
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;

    /// Returns all orders belonging to the user, ordered by `created_at` ascending.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError>;

    /// Atomically leases up to `limit` pending orders to the caller.
    ///
    /// In a single commit, every selected order moves to `PROCESSING` with its `retry_count` bumped, and the set of
    /// mutated numbers is returned. Eligible orders are those in `NEW` or `REGISTERED`, plus `PROCESSING` orders that
    /// have not yet exhausted the retry cap; selection is FIFO by `created_at`. Two concurrent calls never return
    /// overlapping sets.
    fn claim_orders_for_processing(&self, limit: u32) -> impl Future<Output = Result<Vec<OrderNumber>, OrderApiError>> + Send;

    /// Settles an order in one transaction: updates its status and accrual and, when the order transitions into
    /// `PROCESSED` with a positive accrual, credits the owner's balance.
    ///
    /// Settling an order that is already in a terminal state is a no-op, which makes retried settlements safe: the
    /// balance is credited at most once per order.
    fn update_order_and_balance(
        &self,
        number: &OrderNumber,
        status: OrderStatus,
        accrual: Points,
    ) -> impl Future<Output = Result<(), OrderApiError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Cannot insert order, since it already exists")]
    AlreadyExists,
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

// Settlement crosses into the users table; its owner should always exist (the order row carries a foreign key), so
// user-level failures surface as database errors.
impl From<super::UserApiError> for OrderApiError {
    fn from(e: super::UserApiError) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
