//! Loyalty Points Engine
//!
//! The engine is the core of the loyalty-points gateway. It owns:
//! 1. Durable state. Users, orders (receipts) and withdrawals live in a SQLite database behind the seams defined in
//!    the [`traits`] module. You should never need to touch the database directly; use the service APIs instead.
//! 2. The order-processing pipeline. Receipts are uploaded, claimed in batches, evaluated by the external accrual
//!    service (see the [`accrual`] module) and settled transactionally against the owner's balance.
//!
//! The service APIs ([`IdentityApi`], [`OrderFlowApi`], [`LoyaltyApi`]) are generic over the storage seams so that
//! servers can inject the SQLite backend and tests can inject mocks.

pub mod accrual;
pub mod db_types;
pub mod helpers;
mod lpe_api;
mod sqlite;
pub mod traits;

pub mod test_utils;

pub use lpe_api::{
    errors::{IdentityError, LoyaltyError, OrderFlowError},
    identity_api::IdentityApi,
    loyalty_api::LoyaltyApi,
    order_flow_api::OrderFlowApi,
};
pub use sqlite::SqliteDatabase;
