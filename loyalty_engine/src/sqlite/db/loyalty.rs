use log::debug;
use sqlx::SqliteConnection;

use super::users::is_unique_violation;
use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LoyaltyApiError,
};

/// Records a withdrawal. The store assigns `processed_at`; the `order_number` primary key enforces global uniqueness.
pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, LoyaltyApiError> {
    let result = sqlx::query_as::<_, Withdrawal>(
        r#"
        INSERT INTO loyalty (order_number, user_id, amount) VALUES ($1, $2, $3)
        RETURNING *;
        "#,
    )
    .bind(withdrawal.order_number)
    .bind(withdrawal.user_id)
    .bind(withdrawal.amount)
    .fetch_one(conn)
    .await;
    match result {
        Ok(withdrawal) => {
            debug!("📒️ Withdrawal of {} recorded against order [{}]", withdrawal.amount, withdrawal.order_number);
            Ok(withdrawal)
        },
        Err(e) if is_unique_violation(&e) => Err(LoyaltyApiError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_withdrawals_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LoyaltyApiError> {
    let withdrawals = sqlx::query_as("SELECT * FROM loyalty WHERE user_id = $1 ORDER BY processed_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
