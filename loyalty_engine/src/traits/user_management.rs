use thiserror::Error;

use crate::db_types::{Balance, UserRecord};

/// Behaviour for managing user records and their balances.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new user with the given (unique) login and opaque password hash, returning the stored record.
    async fn add_user(&self, login: &str, password_hash: &str) -> Result<UserRecord, UserApiError>;

    /// Fetches the user record for the given login, or `None` if no such user exists.
    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, UserApiError>;

    /// Returns the user's current balance together with the lifetime sum of their withdrawals, or `None` if the user
    /// does not exist.
    async fn fetch_balance(&self, login: &str) -> Result<Option<Balance>, UserApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Cannot insert user, since the login is already taken")]
    AlreadyExists,
    #[error("The user {0} does not exist")]
    UserNotFound(String),
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}
