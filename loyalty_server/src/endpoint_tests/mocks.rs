use lpg_common::Points;
use loyalty_engine::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatus, UserRecord, Withdrawal},
    traits::{LoyaltyApiError, LoyaltyManagement, OrderApiError, OrderManagement, UserApiError, UserManagement},
};
use mockall::mock;

mock! {
    pub Backend {}
    impl UserManagement for Backend {
        async fn add_user(&self, login: &str, password_hash: &str) -> Result<UserRecord, UserApiError>;
        async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, UserApiError>;
        async fn fetch_balance(&self, login: &str) -> Result<Option<Balance>, UserApiError>;
    }
    impl OrderManagement for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderApiError>;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError>;
        async fn claim_orders_for_processing(&self, limit: u32) -> Result<Vec<OrderNumber>, OrderApiError>;
        async fn update_order_and_balance(&self, number: &OrderNumber, status: OrderStatus, accrual: Points) -> Result<(), OrderApiError>;
    }
    impl LoyaltyManagement for Backend {
        async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LoyaltyApiError>;
        async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LoyaltyApiError>;
    }
}
