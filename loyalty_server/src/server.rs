use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use loyalty_engine::{accrual::AccrualClient, IdentityApi, LoyaltyApi, OrderFlowApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        BalanceRoute,
        LoginRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
    worker::start_order_worker,
};

/// The HTTP drain and the worker wind-down must both fit in this budget.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::bootstrap(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.ping().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let accrual = AccrualClient::new(&config.accrual.accrual_addr, config.accrual.processing_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let worker = start_order_worker(OrderFlowApi::new(db.clone(), accrual.clone()), config.accrual.clone());
    let srv = create_server_instance(config, db.clone(), accrual)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    // HTTP has drained; stop the worker, and close the store last.
    worker.stop(SHUTDOWN_GRACE).await;
    db.close().await;
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    accrual: AccrualClient,
) -> Result<Server, ServerError> {
    let listen_addr = config.listen_addr.clone();
    let srv = HttpServer::new(move || {
        let identity_api = IdentityApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), accrual.clone());
        let loyalty_api = LoyaltyApi::new(db.clone());
        let signer = TokenIssuer::new(&config.jwt_secret);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %U"))
            .app_data(web::Data::new(identity_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(loyalty_api))
            .app_data(web::Data::new(signer))
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .shutdown_timeout(SHUTDOWN_GRACE.as_secs())
    .bind(listen_addr)?
    .run();
    Ok(srv)
}
