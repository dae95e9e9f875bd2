//! A three-state circuit breaker guarding the accrual dependency.
//!
//! Closed admits everything and counts consecutive failures; reaching the threshold trips the breaker Open, which
//! rejects everything until the recovery window lapses. The first caller after that is the half-open probe: success
//! closes the breaker, failure re-opens it.
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use log::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Thread-safe; clones share state.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    open_timeout: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, failure_threshold: u32, open_timeout: Duration) -> Self {
        let inner =
            Inner { state: BreakerState::Closed, consecutive_failures: 0, opened_at: None, probe_in_flight: false };
        Self { name, failure_threshold: failure_threshold.max(1), open_timeout, inner: Arc::new(Mutex::new(inner)) }
    }

    /// Whether a request may go out right now. Callers must report the result back via `record_success` /
    /// `record_failure`.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let lapsed = inner.opened_at.map(|t| t.elapsed() >= self.open_timeout).unwrap_or(true);
                if lapsed {
                    self.transition(&mut inner, BreakerState::HalfOpen);
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            },
            BreakerState::HalfOpen => {
                // one probe at a time
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            },
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = 0;
        match inner.state {
            BreakerState::Closed => {},
            BreakerState::HalfOpen => self.transition(&mut inner, BreakerState::Closed),
            // no requests go out while open, so nothing to record
            BreakerState::Open => {},
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        match inner.state {
            BreakerState::Closed => {
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.opened_at = Some(Instant::now());
                    self.transition(&mut inner, BreakerState::Open);
                }
            },
            BreakerState::HalfOpen => {
                // the probe failed; back to square one
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, BreakerState::Open);
            },
            BreakerState::Open => {},
        }
    }

    pub fn state(&self) -> BreakerState {
        let inner = self.lock();
        if inner.state == BreakerState::Open {
            let lapsed = inner.opened_at.map(|t| t.elapsed() >= self.open_timeout).unwrap_or(true);
            if lapsed {
                return BreakerState::HalfOpen;
            }
        }
        inner.state
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState) {
        let from = inner.state;
        inner.state = to;
        inner.probe_in_flight = false;
        match to {
            BreakerState::Open => warn!("🔌️ Circuit breaker '{}': {from} → open", self.name),
            _ => info!("🔌️ Circuit breaker '{}': {from} → {to}", self.name),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
