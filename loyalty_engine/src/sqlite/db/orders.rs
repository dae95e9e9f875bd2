use log::{debug, trace};
use lpg_common::Points;
use sqlx::SqliteConnection;

use super::users::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatus},
    traits::OrderApiError,
};

/// How many times a `PROCESSING` order may be re-claimed before it stops being eligible. Bounds the damage a
/// pathological accrual service can do to a single receipt.
pub const RETRY_CAP: i64 = 3;

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderApiError> {
    let result = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (number, user_id, status, accrual, retry_count, created_at, updated_at)
        VALUES ($1, $2, $3, 0, 0, $4, $4)
        RETURNING *;
        "#,
    )
    .bind(order.number.clone())
    .bind(order.user_id)
    .bind(OrderStatus::New)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order [{}] inserted for user {}", order.number, order.user_id);
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => Err(OrderApiError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderApiError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number).fetch_optional(conn).await?;
    Ok(order)
}

/// All of a user's orders, oldest upload first.
pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderApiError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// The atomic claim: selects up to `limit` eligible orders FIFO by `created_at` and moves them to `PROCESSING` with
/// a bumped `retry_count`, returning the numbers actually mutated.
///
/// The select-and-mutate runs as one statement, and SQLite serializes writers, so concurrent claims commit in some
/// order and each sees the other's `retry_count` bumps: the returned sets are disjoint.
pub async fn claim_orders_for_processing(
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderNumber>, OrderApiError> {
    let numbers: Vec<OrderNumber> = sqlx::query_scalar(
        r#"
        UPDATE orders
        SET status = $1, retry_count = retry_count + 1, updated_at = CURRENT_TIMESTAMP
        WHERE number IN (
            SELECT number FROM orders
            WHERE status IN ($2, $3) OR (status = $1 AND retry_count < $4)
            ORDER BY created_at ASC
            LIMIT $5
        )
        RETURNING number;
        "#,
    )
    .bind(OrderStatus::Processing)
    .bind(OrderStatus::New)
    .bind(OrderStatus::Registered)
    .bind(RETRY_CAP)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    trace!("📝️ Claimed {} orders for processing", numbers.len());
    Ok(numbers)
}

/// Writes the settlement result onto the order row. Does not touch the balance; the caller owns that decision and
/// the surrounding transaction.
pub async fn apply_settlement(
    number: &OrderNumber,
    status: OrderStatus,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<(), OrderApiError> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $1, accrual = $2, retry_count = retry_count + 1, updated_at = CURRENT_TIMESTAMP
        WHERE number = $3;
        "#,
    )
    .bind(status)
    .bind(accrual)
    .bind(number)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(OrderApiError::OrderNotFound(number.clone()));
    }
    Ok(())
}
