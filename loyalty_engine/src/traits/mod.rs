//! # Storage and client seams
//!
//! This module defines the interface contracts the engine's service APIs are built against.
//!
//! * [`UserManagement`] covers user records and balance queries.
//! * [`OrderManagement`] covers order persistence, the claim-for-processing lease and transactional settlement.
//! * [`LoyaltyManagement`] covers withdrawal persistence under the balance invariants.
//! * [`AccrualApi`] is the outbound accrual-service client.
//!
//! The SQLite backend implements the three storage seams; tests substitute mocks at construction time.
mod accrual_api;
mod loyalty_management;
mod order_management;
mod user_management;

pub use accrual_api::{AccrualApi, AccrualApiError, AccrualOutcome};
pub use loyalty_management::{LoyaltyApiError, LoyaltyManagement};
pub use order_management::{OrderApiError, OrderManagement};
pub use user_management::{UserApiError, UserManagement};
