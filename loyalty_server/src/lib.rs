//! # Loyalty Points Gateway server
//!
//! This crate hosts the HTTP surface and the process glue around the [`loyalty_engine`]:
//! * the seven `/api/user/*` endpoints plus `/health`,
//! * HS256 bearer-token authentication,
//! * environment-driven configuration,
//! * the polling worker that drives receipts through the accrual pipeline, guarded by a circuit breaker,
//! * graceful shutdown with a 5 second budget.
//!
//! ## Authentication
//!
//! `POST /api/user/register` and `POST /api/user/login` answer with an `Authorization: Bearer <jwt>` header. The
//! token carries `{username, exp}` claims and is valid for 24 hours. Protected handlers simply take a
//! [`auth::JwtClaims`] parameter; the extractor validates the bearer token and answers 401 on any failure.
pub mod auth;
pub mod breaker;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod worker;

#[cfg(test)]
mod endpoint_tests;
