//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin; anything beyond request decoding and status-code
//! mapping belongs in the engine APIs.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    accrual::AccrualClient,
    db_types::OrderNumber,
    helpers::luhn_valid,
    traits::{LoyaltyManagement, OrderManagement, UserManagement},
    IdentityApi, IdentityError, LoyaltyApi, OrderFlowApi, OrderFlowError,
};

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer},
    data_objects::{OrderListEntry, UserAuthRequest, WithdrawalListEntry, WithdrawalRequest},
    errors::ServerError,
};

// Actix cannot register generic handlers directly, so each route gets a small `HttpServiceFactory` shim built by
// this macro. `route!(name => Method "/path" impl Bound1, Bound2)` produces `NameRoute<A>` where
// `A: Bound1 + Bound2`, registering the handler `name::<A>`.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>); }
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where A: $($bounds +)+ 'static
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health   ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Users    ----------------------------------------------------
route!(register => Post "/api/user/register" impl UserManagement);
/// Registers a new user and logs them straight in: a successful response carries the bearer token.
pub async fn register<A: UserManagement + 'static>(
    body: web::Json<UserAuthRequest>,
    api: web::Data<IdentityApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let UserAuthRequest { login, password } = body.into_inner();
    if login.is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody("login and password must not be empty".to_string()));
    }
    let hash = hash_password(&password)?;
    api.register(&login, &hash).await?;
    let token = signer.issue_token(&login)?;
    Ok(HttpResponse::Ok().insert_header(("Authorization", format!("Bearer {token}"))).finish())
}

route!(login => Post "/api/user/login" impl UserManagement);
pub async fn login<A: UserManagement + 'static>(
    body: web::Json<UserAuthRequest>,
    api: web::Data<IdentityApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let UserAuthRequest { login, password } = body.into_inner();
    let user = match api.fetch_user(&login).await {
        Ok(user) => user,
        // an unknown login answers exactly like a wrong password
        Err(IdentityError::UserNotFound(_)) => return Err(ServerError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&password, &user.password)? {
        debug!("💻️ Failed login attempt for {login}");
        return Err(ServerError::InvalidCredentials);
    }
    let token = signer.issue_token(&login)?;
    info!("💻️ User {login} logged in");
    Ok(HttpResponse::Ok().insert_header(("Authorization", format!("Bearer {token}"))).finish())
}

// ----------------------------------------------   Orders   ----------------------------------------------------
route!(submit_order => Post "/api/user/orders" impl OrderManagement, UserManagement);
/// Accepts a receipt number as a `text/plain` body. 202 on first upload, 200 if this user already uploaded it.
pub async fn submit_order<A: OrderManagement + UserManagement + 'static>(
    claims: JwtClaims,
    body: String,
    api: web::Data<OrderFlowApi<A, AccrualClient>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("order number is missing".to_string()));
    }
    if !luhn_valid(number) {
        debug!("💻️ Rejecting order number that fails the Luhn check");
        return Err(ServerError::InvalidOrderNumber);
    }
    match api.add_order(&claims.username, OrderNumber::from(number)).await {
        Ok(_) => Ok(HttpResponse::Accepted().finish()),
        Err(OrderFlowError::OrderAlreadyUploaded) => Ok(HttpResponse::Ok().finish()),
        Err(e) => Err(e.into()),
    }
}

route!(my_orders => Get "/api/user/orders" impl OrderManagement, UserManagement);
pub async fn my_orders<A: OrderManagement + UserManagement + 'static>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<A, AccrualClient>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_user(&claims.username).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let entries: Vec<OrderListEntry> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(entries))
}

// ----------------------------------------------   Loyalty  ----------------------------------------------------
route!(balance => Get "/api/user/balance" impl UserManagement, LoyaltyManagement);
pub async fn balance<A: UserManagement + LoyaltyManagement + 'static>(
    claims: JwtClaims,
    api: web::Data<LoyaltyApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let balance = api.balance(&claims.username).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/api/user/balance/withdraw" impl UserManagement, LoyaltyManagement);
pub async fn withdraw<A: UserManagement + LoyaltyManagement + 'static>(
    claims: JwtClaims,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<LoyaltyApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    if !luhn_valid(&order) {
        debug!("💻️ Rejecting withdrawal order number that fails the Luhn check");
        return Err(ServerError::InvalidOrderNumber);
    }
    api.process_withdraw(&claims.username, OrderNumber::from(order), sum).await?;
    Ok(HttpResponse::Ok().finish())
}

route!(my_withdrawals => Get "/api/user/withdrawals" impl UserManagement, LoyaltyManagement);
pub async fn my_withdrawals<A: UserManagement + LoyaltyManagement + 'static>(
    claims: JwtClaims,
    api: web::Data<LoyaltyApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let withdrawals = api.withdrawals(&claims.username).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let entries: Vec<WithdrawalListEntry> = withdrawals.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(entries))
}
