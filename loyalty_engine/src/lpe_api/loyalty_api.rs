use log::*;
use lpg_common::Points;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    lpe_api::errors::LoyaltyError,
    traits::{LoyaltyManagement, UserManagement},
};

/// Balance inspection and withdrawal processing.
pub struct LoyaltyApi<B> {
    db: B,
}

impl<B> LoyaltyApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LoyaltyApi<B>
where B: UserManagement + LoyaltyManagement
{
    pub async fn balance(&self, login: &str) -> Result<Balance, LoyaltyError> {
        self.db.fetch_balance(login).await?.ok_or_else(|| LoyaltyError::UserNotFound(login.to_string()))
    }

    /// The user's withdrawals, oldest first. An empty list is the HTTP layer's 204.
    pub async fn withdrawals(&self, login: &str) -> Result<Vec<Withdrawal>, LoyaltyError> {
        let user =
            self.db.fetch_user_by_login(login).await?.ok_or_else(|| LoyaltyError::UserNotFound(login.to_string()))?;
        Ok(self.db.fetch_withdrawals_for_user(&user.id).await?)
    }

    /// Debits the balance and records the withdrawal.
    ///
    /// The balance pre-check here gives a fast answer for the common case; the store re-checks inside the debit
    /// transaction, so a concurrent spend between check and commit still rolls back cleanly.
    pub async fn process_withdraw(
        &self,
        login: &str,
        order_number: OrderNumber,
        amount: Points,
    ) -> Result<Withdrawal, LoyaltyError> {
        if !amount.is_positive() {
            return Err(LoyaltyError::InvalidWithdrawalAmount);
        }
        let user =
            self.db.fetch_user_by_login(login).await?.ok_or_else(|| LoyaltyError::UserNotFound(login.to_string()))?;
        if user.balance < amount {
            debug!("📒️ Withdrawal of {amount} refused for {login}: balance is only {}", user.balance);
            return Err(LoyaltyError::InsufficientFunds);
        }
        let withdrawal =
            self.db.add_withdrawal(NewWithdrawal { order_number, user_id: user.id, amount }).await?;
        info!("📒️ {login} withdrew {amount} against order [{}]", withdrawal.order_number);
        Ok(withdrawal)
    }
}
