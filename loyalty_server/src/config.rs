use std::{env, fmt::Display, time::Duration};

use log::*;

use crate::auth::SigningKey;

const DEFAULT_LISTEN_ADDR: &str = "localhost:8080";
const DEFAULT_ACCRUAL_ADDR: &str = "http://localhost:8081";
const DEFAULT_JWT_SECRET: &str = "secret";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_BATCH_SIZE: u32 = 10;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BREAKER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BREAKER_FAILURES: u32 = 5;

#[derive(Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: SigningKey,
    pub log_level: String,
    pub accrual: AccrualConfig,
}

/// Everything the polling worker and the accrual client need.
#[derive(Clone, Debug)]
pub struct AccrualConfig {
    pub accrual_addr: String,
    /// Maximum claims per worker tick.
    pub batch_size: u32,
    pub poll_interval: Duration,
    /// Per-order budget: the accrual round trip and the settlement together must fit in this.
    pub processing_timeout: Duration,
    /// How long the breaker stays open before letting a probe through.
    pub breaker_timeout: Duration,
    /// Consecutive failed batches needed to trip the breaker.
    pub breaker_failures: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            database_url: String::default(),
            jwt_secret: SigningKey::new(DEFAULT_JWT_SECRET),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            accrual: AccrualConfig::default(),
        }
    }
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            accrual_addr: DEFAULT_ACCRUAL_ADDR.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            processing_timeout: Duration::from_secs(DEFAULT_PROCESSING_TIMEOUT_SECS),
            breaker_timeout: Duration::from_secs(DEFAULT_BREAKER_TIMEOUT_SECS),
            breaker_failures: DEFAULT_BREAKER_FAILURES,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let listen_addr = env::var("RUN_ADDRESS").ok().unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        let database_url = env::var("DATABASE_URI").ok().unwrap_or_else(|| {
            error!("DATABASE_URI is not set. Please set it to the DSN for the loyalty store.");
            String::default()
        });
        let jwt_secret = SigningKey::new(env::var("JWT_SECRET").ok().unwrap_or_else(|| {
            warn!("JWT_SECRET is not set. Using the default signing key, which is fine for development only.");
            DEFAULT_JWT_SECRET.into()
        }));
        let log_level = env::var("LOG_LEVEL").ok().unwrap_or_else(|| DEFAULT_LOG_LEVEL.into());
        let accrual = AccrualConfig {
            accrual_addr: env::var("ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| DEFAULT_ACCRUAL_ADDR.into()),
            batch_size: parsed_env("WORKER_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            poll_interval: seconds_env("WORKER_POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS),
            processing_timeout: seconds_env("WORKER_PROCESSING_TIMEOUT", DEFAULT_PROCESSING_TIMEOUT_SECS),
            breaker_timeout: seconds_env("WORKER_BREAKER_TIMEOUT", DEFAULT_BREAKER_TIMEOUT_SECS),
            breaker_failures: parsed_env("WORKER_BREAKER_FAILURES", DEFAULT_BREAKER_FAILURES),
        };
        Self { listen_addr, database_url, jwt_secret, log_level, accrual }
    }

    /// The stock signing key is fine for development; anywhere else it deserves a loud warning.
    pub fn has_default_jwt_secret(&self) -> bool {
        self.jwt_secret == SigningKey::new(DEFAULT_JWT_SECRET)
    }
}

fn parsed_env<T: std::str::FromStr + Display>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|_| {
            error!("{s} is not a valid value for {var}. Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

/// Durations are configured as whole seconds, with an optional trailing `s` (`5` and `5s` both mean five seconds).
fn seconds_env(var: &str, default_secs: u64) -> Duration {
    match env::var(var) {
        Ok(s) => {
            let trimmed = s.trim().trim_end_matches('s');
            let secs = trimmed.parse::<u64>().unwrap_or_else(|_| {
                error!("{s} is not a valid duration for {var}. Using the default, {default_secs}s, instead.");
                default_secs
            });
            Duration::from_secs(secs)
        },
        Err(_) => Duration::from_secs(default_secs),
    }
}
