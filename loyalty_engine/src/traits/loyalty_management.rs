use thiserror::Error;

use crate::db_types::{NewWithdrawal, Withdrawal};

/// Behaviour for recording withdrawals against user balances.
#[allow(async_fn_in_trait)]
pub trait LoyaltyManagement {
    /// Debits the user's balance and records the withdrawal in one transaction.
    ///
    /// The debit and the insert stand or fall together: a balance that would go negative rolls back with
    /// [`LoyaltyApiError::InsufficientFunds`], and a duplicate `order_number` rolls back with
    /// [`LoyaltyApiError::AlreadyExists`].
    async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LoyaltyApiError>;

    /// Returns the user's withdrawals, ordered by `processed_at` ascending.
    async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LoyaltyApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum LoyaltyApiError {
    #[error("A withdrawal against this order number has already been recorded")]
    AlreadyExists,
    #[error("The balance is too low to cover the withdrawal")]
    InsufficientFunds,
    #[error("The user {0} does not exist")]
    UserNotFound(String),
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LoyaltyApiError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyApiError::DatabaseError(e.to_string())
    }
}

impl From<super::UserApiError> for LoyaltyApiError {
    fn from(e: super::UserApiError) -> Self {
        match e {
            super::UserApiError::UserNotFound(login) => LoyaltyApiError::UserNotFound(login),
            other => LoyaltyApiError::DatabaseError(other.to_string()),
        }
    }
}
