use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use lpg_common::Points;
use loyalty_engine::{
    db_types::{Balance, OrderNumber, Withdrawal},
    traits::LoyaltyApiError,
    LoyaltyApi,
};

use super::{
    helpers::{get_request, post_json, user_record, valid_token},
    mocks::MockBackend,
};
use crate::routes::{BalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn register_loyalty(cfg: &mut ServiceConfig, backend: MockBackend) {
    cfg.service(BalanceRoute::<MockBackend>::new())
        .service(WithdrawRoute::<MockBackend>::new())
        .service(MyWithdrawalsRoute::<MockBackend>::new())
        .app_data(web::Data::new(LoyaltyApi::new(backend)));
}

fn configure_balance(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_balance().returning(|_| {
        Ok(Some(Balance { current: Points::try_from(100.5).unwrap(), withdrawn: Points::try_from(40.0).unwrap() }))
    });
    register_loyalty(cfg, backend);
}

fn configure_withdraw_ok(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 100.0))));
    backend.expect_add_withdrawal().returning(|w| {
        Ok(Withdrawal {
            order_number: w.order_number,
            user_id: w.user_id,
            amount: w.amount,
            processed_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        })
    });
    register_loyalty(cfg, backend);
}

fn configure_withdraw_poor(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 50.0))));
    register_loyalty(cfg, backend);
}

fn configure_withdraw_duplicate(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 100.0))));
    backend.expect_add_withdrawal().returning(|_| Err(LoyaltyApiError::AlreadyExists));
    register_loyalty(cfg, backend);
}

fn configure_withdrawal_listing(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 60.0))));
    backend.expect_fetch_withdrawals_for_user().returning(|user_id| {
        Ok(vec![Withdrawal {
            order_number: OrderNumber::from("79927398713"),
            user_id: user_id.to_string(),
            amount: Points::try_from(40.0).unwrap(),
            processed_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }])
    });
    register_loyalty(cfg, backend);
}

fn configure_empty_withdrawals(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 50.0))));
    backend.expect_fetch_withdrawals_for_user().returning(|_| Ok(vec![]));
    register_loyalty(cfg, backend);
}

#[actix_web::test]
async fn balance_reports_current_and_withdrawn() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, body) = get_request(&token, "/api/user/balance", configure_balance).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current":100.5,"withdrawn":40.0}"#);
}

#[actix_web::test]
async fn balance_requires_authentication() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/api/user/balance", configure_balance).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdrawal_succeeds_with_sufficient_funds() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_json(
        &token,
        "/api/user/balance/withdraw",
        r#"{"order":"79927398713","sum":40}"#,
        configure_withdraw_ok,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn withdrawal_of_more_than_the_balance_is_payment_required() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_json(
        &token,
        "/api/user/balance/withdraw",
        r#"{"order":"79927398713","sum":60}"#,
        configure_withdraw_poor,
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn withdrawal_rejects_luhn_invalid_numbers() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_json(
        &token,
        "/api/user/balance/withdraw",
        r#"{"order":"12345678901","sum":1}"#,
        |cfg| register_loyalty(cfg, MockBackend::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn withdrawal_rejects_a_zero_sum() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_json(
        &token,
        "/api/user/balance/withdraw",
        r#"{"order":"79927398713","sum":0}"#,
        |cfg| register_loyalty(cfg, MockBackend::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn duplicate_withdrawal_numbers_conflict() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_json(
        &token,
        "/api/user/balance/withdraw",
        r#"{"order":"79927398713","sum":10}"#,
        configure_withdraw_duplicate,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdrawals_are_listed_with_wire_names() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, body) = get_request(&token, "/api/user/withdrawals", configure_withdrawal_listing).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"order":"79927398713","sum":40.0,"processed_at":"2024-03-01T09:00:00Z"}]"#);
}

#[actix_web::test]
async fn no_withdrawals_is_no_content() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = get_request(&token, "/api/user/withdrawals", configure_empty_withdrawals).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
