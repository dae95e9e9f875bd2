use log::*;
use lpg_common::Points;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatus},
    lpe_api::errors::OrderFlowError,
    traits::{AccrualApi, AccrualOutcome, OrderApiError, OrderManagement, UserManagement},
};

/// `OrderFlowApi` drives an order through its life: upload, listing, the claim lease for the polling worker, and the
/// per-order accrual round trip that settles it.
pub struct OrderFlowApi<B, A> {
    db: B,
    accrual: A,
}

impl<B, A> OrderFlowApi<B, A> {
    pub fn new(db: B, accrual: A) -> Self {
        Self { db, accrual }
    }
}

impl<B, A> OrderFlowApi<B, A>
where
    B: OrderManagement + UserManagement,
    A: AccrualApi,
{
    /// Uploads a receipt for the given user. Re-uploading one's own receipt and poaching someone else's are
    /// distinguished so the HTTP layer can answer 200 vs 409.
    pub async fn add_order(&self, login: &str, number: OrderNumber) -> Result<Order, OrderFlowError> {
        let user =
            self.db.fetch_user_by_login(login).await?.ok_or_else(|| OrderFlowError::UserNotFound(login.to_string()))?;
        if let Some(existing) = self.db.fetch_order_by_number(&number).await? {
            return Err(upload_conflict(&existing, &user.id));
        }
        match self.db.insert_order(NewOrder::new(number.clone(), user.id.clone())).await {
            Ok(order) => {
                info!("🔄️📦️ Order [{}] accepted for user {login}", order.number);
                Ok(order)
            },
            // Lost a race against a concurrent upload of the same number; re-fetch to find out who won.
            Err(OrderApiError::AlreadyExists) => match self.db.fetch_order_by_number(&number).await? {
                Some(existing) => Err(upload_conflict(&existing, &user.id)),
                None => Err(OrderApiError::AlreadyExists.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// The user's orders, oldest upload first. An empty list is the HTTP layer's 204.
    pub async fn orders_for_user(&self, login: &str) -> Result<Vec<Order>, OrderFlowError> {
        let user =
            self.db.fetch_user_by_login(login).await?.ok_or_else(|| OrderFlowError::UserNotFound(login.to_string()))?;
        Ok(self.db.fetch_orders_for_user(&user.id).await?)
    }

    /// Leases up to `limit` pending orders to the caller; see [`OrderManagement::claim_orders_for_processing`].
    pub async fn claim_orders_for_processing(&self, limit: u32) -> Result<Vec<OrderNumber>, OrderFlowError> {
        Ok(self.db.claim_orders_for_processing(limit).await?)
    }

    /// Runs one claimed order through the accrual service and settles the result.
    ///
    /// Every outcome settles *something*, so a claimed order always escapes `PROCESSING` eventually, either through
    /// a terminal status from the service or through the retry cap. Back-pressure (`RateLimited`) and an unknown
    /// receipt (`NotRegistered`) are normal pipeline states and return `Ok`; an unreachable or protocol-breaking
    /// service settles the order back to `PROCESSING` and then reports the failure so the caller's circuit breaker
    /// sees it.
    pub async fn process_order(&self, number: &OrderNumber) -> Result<(), OrderFlowError> {
        let outcome = match self.accrual.order_accrual(number).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("🔄️🎯️ Accrual lookup for [{number}] failed: {e}");
                self.db.update_order_and_balance(number, OrderStatus::Processing, Points::default()).await?;
                return Err(e.into());
            },
        };
        match outcome {
            AccrualOutcome::Evaluated { status, accrual } => {
                debug!("🔄️🎯️ Order [{number}] evaluated as {status} ({accrual})");
                self.db.update_order_and_balance(number, status, accrual).await?;
                Ok(())
            },
            AccrualOutcome::RateLimited { retry_after } => {
                debug!(
                    "🔄️🎯️ Accrual back-pressure: order [{number}] stays in processing, limiter blocked for {}s",
                    retry_after.as_secs()
                );
                self.db.update_order_and_balance(number, OrderStatus::Processing, Points::default()).await?;
                Ok(())
            },
            AccrualOutcome::NotRegistered => {
                debug!("🔄️🎯️ Order [{number}] not yet known to the accrual service");
                self.db.update_order_and_balance(number, OrderStatus::Processing, Points::default()).await?;
                Ok(())
            },
            AccrualOutcome::Unavailable => {
                self.db.update_order_and_balance(number, OrderStatus::Processing, Points::default()).await?;
                Err(OrderFlowError::AccrualUnavailable)
            },
        }
    }
}

fn upload_conflict(existing: &Order, user_id: &str) -> OrderFlowError {
    if existing.user_id == user_id {
        OrderFlowError::OrderAlreadyUploaded
    } else {
        OrderFlowError::OrderUploadedByAnother
    }
}
