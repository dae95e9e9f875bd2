use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use lpg_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------    OrderNumber     ----------------------------------------------------------
/// A receipt number. Globally unique and Luhn-valid by the time it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    OrderStatus     ----------------------------------------------------------
/// The lifecycle state of an order. Stored, serialized and spoken on the accrual wire as the uppercase token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Freshly uploaded; the accrual service has not seen it yet.
    New,
    /// Registered with the accrual service, evaluation pending.
    Registered,
    /// Claimed by a worker at least once; not yet settled terminally.
    Processing,
    /// Terminal: evaluated, points credited.
    Processed,
    /// Terminal: rejected by the accrual service.
    Invalid,
}

impl OrderStatus {
    /// Terminal states never change again, and never credit the balance again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Invalid)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Registered => write!(f, "REGISTERED"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Processed => write!(f, "PROCESSED"),
            OrderStatus::Invalid => write!(f, "INVALID"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "INVALID" => Ok(Self::Invalid),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       Order        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub number: OrderNumber,
    /// The owning user. Immutable once set.
    pub user_id: String,
    pub status: OrderStatus,
    /// Only meaningful once `status` is `Processed`.
    pub accrual: Points,
    /// Bumped on every claim; orders stuck in `Processing` stop being claimable once it reaches the retry cap.
    pub retry_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder      ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: String) -> Self {
        Self { number, user_id, created_at: Utc::now() }
    }
}

//--------------------------------------     UserRecord     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    /// UUID, assigned at registration.
    pub id: String,
    pub login: String,
    /// Opaque password hash. The engine stores it; it never interprets it.
    pub password: String,
    pub balance: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Balance       ----------------------------------------------------------
/// A user's live balance and the lifetime sum of their withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------     Withdrawal     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Withdrawal {
    pub order_number: OrderNumber,
    pub user_id: String,
    pub amount: Points,
    /// Assigned by the store at insert.
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub order_number: OrderNumber,
    pub user_id: String,
    pub amount: Points,
}
