use log::trace;
use lpg_common::Points;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{Balance, UserRecord},
    traits::UserApiError,
};

/// Inserts a new user with a fresh UUID and a zero balance.
pub async fn insert_user(
    login: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<UserRecord, UserApiError> {
    let id = Uuid::new_v4().to_string();
    let result = sqlx::query_as::<_, UserRecord>(
        r#"
        INSERT INTO users (id, login, password) VALUES ($1, $2, $3)
        RETURNING *;
        "#,
    )
    .bind(id)
    .bind(login)
    .bind(password_hash)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => {
            trace!("🧑️ User {login} created with id {}", user.id);
            Ok(user)
        },
        Err(e) if is_unique_violation(&e) => Err(UserApiError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<UserRecord>, UserApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}

/// The live balance plus the lifetime sum of withdrawals, in one aggregated query.
pub async fn fetch_balance(login: &str, conn: &mut SqliteConnection) -> Result<Option<Balance>, UserApiError> {
    let balance = sqlx::query_as(
        r#"
        SELECT users.balance AS current, COALESCE(SUM(loyalty.amount), 0) AS withdrawn
        FROM users LEFT JOIN loyalty ON users.id = loyalty.user_id
        WHERE users.login = $1
        GROUP BY users.id;
        "#,
    )
    .bind(login)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}

/// Adds `amount` to the user's balance. Returns an error if the user row has vanished.
pub async fn credit_balance(user_id: &str, amount: Points, conn: &mut SqliteConnection) -> Result<(), UserApiError> {
    let result =
        sqlx::query("UPDATE users SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(UserApiError::UserNotFound(user_id.to_string()));
    }
    Ok(())
}

/// Subtracts `amount` from the user's balance, refusing to take it below zero. Returns whether the debit happened.
pub async fn debit_balance(user_id: &str, amount: Points, conn: &mut SqliteConnection) -> Result<bool, UserApiError> {
    let result = sqlx::query(
        "UPDATE users SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND balance >= $1",
    )
    .bind(amount)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().map(|db| db.is_unique_violation()).unwrap_or(false)
}
