//! The engine's public service APIs. Thin, generic wrappers over the storage seams that carry the business rules:
//! ownership checks on upload, the accrual-outcome translation, and the withdrawal invariants.
pub mod errors;
pub mod identity_api;
pub mod loyalty_api;
pub mod order_flow_api;
