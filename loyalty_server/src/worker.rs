//! The polling worker: one task per process that periodically claims a batch of pending orders and runs each through
//! the accrual pipeline. The whole batch sits behind the circuit breaker; each order gets its own timeout.
use std::time::Duration;

use log::*;
use loyalty_engine::{
    traits::{AccrualApi, OrderManagement, UserManagement},
    OrderFlowApi,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, timeout, MissedTickBehavior},
};

use crate::{breaker::CircuitBreaker, config::AccrualConfig};

/// Spawns the worker and returns a handle to stop it. Do not await the task yourself; it runs until stopped.
pub fn start_order_worker<B, A>(orders: OrderFlowApi<B, A>, config: AccrualConfig) -> WorkerHandle
where
    B: OrderManagement + UserManagement + Send + Sync + 'static,
    A: AccrualApi + Send + Sync + 'static,
{
    let (quit_tx, quit_rx) = watch::channel(false);
    let breaker = CircuitBreaker::new("accrual-service", config.breaker_failures, config.breaker_timeout);
    let worker = OrderPollWorker { orders, breaker, config, quit: quit_rx };
    let join = tokio::spawn(worker.run());
    WorkerHandle { quit: quit_tx, join }
}

pub struct WorkerHandle {
    quit: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signals the worker to stop and waits for the current tick to wind down, aborting the task outright if it
    /// overstays `grace`.
    pub async fn stop(self, grace: Duration) {
        let _ = self.quit.send(true);
        let mut join = self.join;
        match timeout(grace, &mut join).await {
            Ok(Ok(())) => info!("🛠️ Order polling worker stopped"),
            Ok(Err(e)) => error!("🛠️ Order polling worker task failed during shutdown: {e}"),
            Err(_) => {
                warn!("🛠️ Order polling worker did not stop within {grace:?}; aborting it");
                join.abort();
            },
        }
    }
}

struct OrderPollWorker<B, A> {
    orders: OrderFlowApi<B, A>,
    breaker: CircuitBreaker,
    config: AccrualConfig,
    quit: watch::Receiver<bool>,
}

impl<B, A> OrderPollWorker<B, A>
where
    B: OrderManagement + UserManagement,
    A: AccrualApi,
{
    async fn run(mut self) {
        let mut timer = interval(self.config.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut quit = self.quit.clone();
        info!(
            "🛠️ Order polling worker started: up to {} orders every {:?}",
            self.config.batch_size, self.config.poll_interval
        );
        loop {
            tokio::select! {
                _ = quit.changed() => {
                    info!("🛠️ Order polling worker stopped by quit signal");
                    return;
                },
                _ = timer.tick() => {},
            }
            self.process_batch().await;
        }
    }

    async fn process_batch(&mut self) {
        if !self.breaker.allow_request() {
            debug!("🛠️ Circuit breaker is open; skipping this tick");
            return;
        }
        match self.run_batch().await {
            Ok(()) => self.breaker.record_success(),
            Err(e) => {
                error!("🛠️ Order batch processing failed: {e}");
                self.breaker.record_failure();
            },
        }
    }

    /// Claims a batch and processes it sequentially, so the limiter's pacing is respected without fan-out surprises.
    /// The batch counts as failed if any order returned a non-ignored error; the last such error is reported.
    async fn run_batch(&mut self) -> Result<(), String> {
        let numbers = self.orders.claim_orders_for_processing(self.config.batch_size).await.map_err(|e| {
            warn!("🛠️ Failed to claim orders: {e}");
            e.to_string()
        })?;
        if numbers.is_empty() {
            trace!("🛠️ Nothing to process this tick");
            return Ok(());
        }
        debug!("🛠️ Claimed {} orders for processing", numbers.len());
        let mut last_err = None;
        for number in numbers {
            if *self.quit.borrow() {
                debug!("🛠️ Quit signalled mid-batch; abandoning the remaining orders");
                break;
            }
            match timeout(self.config.processing_timeout, self.orders.process_order(&number)).await {
                Ok(Ok(())) => {},
                Ok(Err(e)) => {
                    warn!("🛠️ Failed to process order [{number}]: {e}");
                    last_err = Some(e.to_string());
                },
                Err(_) => {
                    warn!("🛠️ Processing order [{number}] timed out after {:?}", self.config.processing_timeout);
                    last_err = Some(format!("processing order [{number}] timed out"));
                },
            }
        }
        match last_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}
