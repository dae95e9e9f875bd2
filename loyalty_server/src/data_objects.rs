//! Request and response shapes for the public API. Field names are part of the wire contract; do not rename.
use chrono::{DateTime, Utc};
use lpg_common::Points;
use loyalty_engine::db_types::{Order, OrderStatus, Withdrawal};
use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize)]
pub struct UserAuthRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Points,
}

/// One entry of `GET /api/user/orders`. `accrual` appears only once the order is `PROCESSED`; `uploaded_at` is
/// RFC 3339.
#[derive(Debug, Clone, Serialize)]
pub struct OrderListEntry {
    pub number: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderListEntry {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatus::Processed).then_some(order.accrual);
        Self { number: order.number.0, status: order.status, accrual, uploaded_at: order.created_at }
    }
}

/// One entry of `GET /api/user/withdrawals`.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalListEntry {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalListEntry {
    fn from(withdrawal: Withdrawal) -> Self {
        Self { order: withdrawal.order_number.0, sum: withdrawal.amount, processed_at: withdrawal.processed_at }
    }
}
