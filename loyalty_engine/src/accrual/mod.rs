//! The outbound side of the pipeline: the accrual-service HTTP client and the adaptive rate limiter that
//! throttles it based on the service's response headers.

mod client;
mod limiter;

pub use client::AccrualClient;
pub use limiter::AdaptiveLimiter;
