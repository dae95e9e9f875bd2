use thiserror::Error;

use crate::traits::{AccrualApiError, LoyaltyApiError, OrderApiError, UserApiError};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("A user with this login already exists")]
    UserAlreadyExists,
    #[error("The user {0} does not exist")]
    UserNotFound(String),
    #[error("{0}")]
    Backend(#[from] UserApiError),
}

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("This order has already been uploaded by this user")]
    OrderAlreadyUploaded,
    #[error("This order has already been uploaded by another user")]
    OrderUploadedByAnother,
    #[error("The user {0} does not exist")]
    UserNotFound(String),
    #[error("The accrual service is unavailable")]
    AccrualUnavailable,
    #[error("{0}")]
    AccrualError(#[from] AccrualApiError),
    #[error("{0}")]
    OrderError(#[from] OrderApiError),
    #[error("{0}")]
    UserError(#[from] UserApiError),
}

#[derive(Debug, Error)]
pub enum LoyaltyError {
    #[error("Withdrawal amounts must be positive")]
    InvalidWithdrawalAmount,
    #[error("The balance is too low to cover the withdrawal")]
    InsufficientFunds,
    #[error("A withdrawal against this order number already exists")]
    DuplicateWithdrawal,
    #[error("The user {0} does not exist")]
    UserNotFound(String),
    #[error("{0}")]
    UserError(#[from] UserApiError),
    #[error("Internal storage error: {0}")]
    StoreError(String),
}

impl From<LoyaltyApiError> for LoyaltyError {
    fn from(e: LoyaltyApiError) -> Self {
        match e {
            LoyaltyApiError::AlreadyExists => LoyaltyError::DuplicateWithdrawal,
            LoyaltyApiError::InsufficientFunds => LoyaltyError::InsufficientFunds,
            LoyaltyApiError::UserNotFound(login) => LoyaltyError::UserNotFound(login),
            LoyaltyApiError::DatabaseError(s) => LoyaltyError::StoreError(s),
        }
    }
}
