use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{IdentityError, LoyaltyError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid order number format")]
    InvalidOrderNumber,
    #[error("Authentication required: {0}")]
    Unauthorized(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("{0}")]
    Identity(#[from] IdentityError),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("{0}")]
    Loyalty(#[from] LoyaltyError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    InitializeError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Identity(IdentityError::UserAlreadyExists) => StatusCode::CONFLICT,
            Self::OrderFlow(OrderFlowError::OrderUploadedByAnother) => StatusCode::CONFLICT,
            Self::Loyalty(LoyaltyError::InsufficientFunds) => StatusCode::PAYMENT_REQUIRED,
            Self::Loyalty(LoyaltyError::InvalidWithdrawalAmount) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Loyalty(LoyaltyError::DuplicateWithdrawal) => StatusCode::CONFLICT,
            // Everything else, including an unknown user behind a valid token, is an internal error.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // 5xx bodies never leak internals
            error!("💻️ Internal error: {self}");
            return HttpResponse::build(status).insert_header(ContentType::plaintext()).body("Internal Server Error");
        }
        HttpResponse::build(status).insert_header(ContentType::plaintext()).body(self.to_string())
    }
}
