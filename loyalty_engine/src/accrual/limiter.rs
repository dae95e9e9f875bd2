use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use log::*;
use tokio::time::{sleep, Instant};

/// A token-bucket rate limiter that retunes itself from accrual-service response headers.
///
/// Freshly constructed, the limiter is unrestricted. Advisory `X-RateLimit-*` headers set a concrete rate and burst
/// via [`apply_hints`](AdaptiveLimiter::apply_hints); a 429 pins the rate to zero for the `Retry-After` window via
/// [`block_for`](AdaptiveLimiter::block_for), after which the limiter reverts to unrestricted.
///
/// One limiter is shared by every call a client instance makes, so back-pressure from the service is observed by all
/// workers at once. Waits are plain `tokio` sleeps; callers cancel by dropping or timing out the `acquire` future.
#[derive(Clone, Debug)]
pub struct AdaptiveLimiter {
    bucket: Arc<Mutex<Bucket>>,
}

#[derive(Debug)]
struct Bucket {
    /// Tokens per second. `None` means unrestricted.
    rate: Option<f64>,
    burst: f64,
    tokens: f64,
    last_refill: Instant,
    /// Hard block from a 429. While set, nothing is admitted.
    blocked_until: Option<Instant>,
}

impl Default for AdaptiveLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveLimiter {
    pub fn new() -> Self {
        let bucket = Bucket { rate: None, burst: 1.0, tokens: 1.0, last_refill: Instant::now(), blocked_until: None };
        Self { bucket: Arc::new(Mutex::new(bucket)) }
    }

    /// Waits until the next request may be sent.
    pub async fn acquire(&self) {
        loop {
            match self.try_take() {
                None => return,
                Some(wait) => sleep(wait).await,
            }
        }
    }

    /// Retunes the limiter from `X-RateLimit-Limit: L` / `X-RateLimit-Reset: T` (unix seconds) headers: the rate
    /// becomes `L` requests over the remaining window, with a burst of `L`.
    pub fn apply_hints(&self, limit: u32, reset_unix: i64) {
        let window = reset_unix - Utc::now().timestamp();
        if limit == 0 || window <= 0 {
            return;
        }
        let rate = f64::from(limit) / window as f64;
        debug!("⏱️ Accrual rate hint applied: {limit} requests over the next {window}s");
        self.update(rate, limit);
    }

    /// Sets an explicit rate (tokens per second) and burst. A hint describes a fresh allowance for the coming window,
    /// so the bucket refills to the new burst.
    pub fn update(&self, rate: f64, burst: u32) {
        if !rate.is_finite() || rate <= 0.0 || burst == 0 {
            return;
        }
        let mut bucket = self.lock();
        bucket.rate = Some(rate);
        bucket.burst = f64::from(burst);
        bucket.tokens = bucket.burst;
        bucket.last_refill = Instant::now();
    }

    /// Admits nothing for `duration`, then reverts to the unrestricted state.
    pub fn block_for(&self, duration: Duration) {
        let mut bucket = self.lock();
        bucket.blocked_until = Some(Instant::now() + duration);
    }

    // Takes a token if one is available, otherwise says how long to wait before trying again.
    fn try_take(&self) -> Option<Duration> {
        let mut bucket = self.lock();
        let now = Instant::now();
        if let Some(until) = bucket.blocked_until {
            if now < until {
                return Some(until - now);
            }
            // The hard block has lapsed; the limiter reverts to unrestricted until the next hint arrives.
            bucket.blocked_until = None;
            bucket.rate = None;
            bucket.burst = 1.0;
            bucket.tokens = 1.0;
        }
        let Some(rate) = bucket.rate else {
            return None;
        };
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(bucket.burst);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - bucket.tokens) / rate))
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        // The bucket holds no invariants worth dying for, so a poisoned lock is recoverable.
        self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
