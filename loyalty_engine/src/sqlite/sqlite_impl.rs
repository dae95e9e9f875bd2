//! `SqliteDatabase` is the concrete store behind the engine's storage seams.
//!
//! It implements [`UserManagement`], [`OrderManagement`] and [`LoyaltyManagement`] over a shared `sqlx` pool. The
//! multi-step operations (settlement, withdrawal) run inside explicit transactions so that balances stay consistent
//! at every commit boundary.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{loyalty, new_pool, orders, users};
use crate::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatus, UserRecord, Withdrawal},
    traits::{LoyaltyApiError, LoyaltyManagement, OrderApiError, OrderManagement, UserApiError, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// The standard entry point at server startup: creates the database if it does not exist yet, connects, and
    /// brings the schema up to date.
    pub async fn bootstrap(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("🗃️ Creating database at {url}");
            Sqlite::create_database(url).await?;
        }
        let db = Self::new_with_url(url, max_connections).await?;
        db.migrate().await.map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
        Ok(db)
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Must run before the first query; a failure here is fatal at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl UserManagement for SqliteDatabase {
    async fn add_user(&self, login: &str, password_hash: &str) -> Result<UserRecord, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, password_hash, &mut conn).await
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_login(login, &mut conn).await
    }

    async fn fetch_balance(&self, login: &str) -> Result<Option<Balance>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_balance(login, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(number, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn claim_orders_for_processing(&self, limit: u32) -> Result<Vec<OrderNumber>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::claim_orders_for_processing(limit, &mut conn).await
    }

    async fn update_order_and_balance(
        &self,
        number: &OrderNumber,
        status: OrderStatus,
        accrual: Points,
    ) -> Result<(), OrderApiError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| OrderApiError::OrderNotFound(number.clone()))?;
        // Terminal orders never change and never credit twice; a retried settlement lands here and does nothing.
        if order.status.is_terminal() {
            debug!("🗃️ Order [{number}] is already {}; settlement is a no-op", order.status);
            return Ok(());
        }
        orders::apply_settlement(number, status, accrual, &mut tx).await?;
        if status == OrderStatus::Processed && accrual.is_positive() {
            users::credit_balance(&order.user_id, accrual, &mut tx).await?;
            debug!("🗃️ Order [{number}] processed; credited {accrual} to user {}", order.user_id);
        }
        tx.commit().await?;
        Ok(())
    }
}

impl LoyaltyManagement for SqliteDatabase {
    async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LoyaltyApiError> {
        let mut tx = self.pool.begin().await?;
        let debited = users::debit_balance(&withdrawal.user_id, withdrawal.amount, &mut tx).await?;
        if !debited {
            // The service layer pre-checked the balance, so a refused debit means it was spent concurrently.
            debug!(
                "🗃️ Withdrawal of {} against order [{}] refused: balance too low",
                withdrawal.amount, withdrawal.order_number
            );
            return Err(LoyaltyApiError::InsufficientFunds);
        }
        let recorded = loyalty::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        Ok(recorded)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LoyaltyApiError> {
        let mut conn = self.pool.acquire().await?;
        loyalty::fetch_withdrawals_for_user(user_id, &mut conn).await
    }
}
