use std::time::Duration;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_engine::{accrual::AccrualClient, db_types::OrderStatus, OrderFlowApi};

use super::{
    helpers::{get_request, order, post_plain, user_record, valid_token},
    mocks::MockBackend,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

/// A never-dialed client; the HTTP handlers don't talk to the accrual service.
fn idle_accrual() -> AccrualClient {
    AccrualClient::new("http://localhost:9", Duration::from_secs(1)).expect("Failed to build accrual client")
}

fn register_orders(cfg: &mut ServiceConfig, backend: MockBackend) {
    cfg.service(SubmitOrderRoute::<MockBackend>::new())
        .service(MyOrdersRoute::<MockBackend>::new())
        .app_data(web::Data::new(OrderFlowApi::new(backend, idle_accrual())));
}

fn configure_fresh_upload(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 0.0))));
    backend.expect_fetch_order_by_number().returning(|_| Ok(None));
    backend.expect_insert_order().returning(|new_order| {
        Ok(order(new_order.number.as_str(), &new_order.user_id, OrderStatus::New, 0.0))
    });
    register_orders(cfg, backend);
}

fn configure_own_duplicate(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 0.0))));
    backend
        .expect_fetch_order_by_number()
        .returning(|number| Ok(Some(order(number.as_str(), "id-alice", OrderStatus::Processing, 0.0))));
    register_orders(cfg, backend);
}

fn configure_foreign_duplicate(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 0.0))));
    backend
        .expect_fetch_order_by_number()
        .returning(|number| Ok(Some(order(number.as_str(), "id-bob", OrderStatus::New, 0.0))));
    register_orders(cfg, backend);
}

fn configure_listing(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 0.0))));
    backend.expect_fetch_orders_for_user().returning(|user_id| {
        Ok(vec![
            order("12345678903", user_id, OrderStatus::Processed, 100.5),
            order("79927398713", user_id, OrderStatus::New, 0.0),
        ])
    });
    register_orders(cfg, backend);
}

fn configure_empty_listing(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| Ok(Some(user_record(login, 0.0))));
    backend.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
    register_orders(cfg, backend);
}

#[actix_web::test]
async fn fresh_upload_is_accepted() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_plain(&token, "/api/user/orders", "12345678903", configure_fresh_upload).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn re_uploading_your_own_order_is_ok() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_plain(&token, "/api/user/orders", "12345678903", configure_own_duplicate).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn uploading_someone_elses_order_conflicts() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_plain(&token, "/api/user/orders", "12345678903", configure_foreign_duplicate).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn luhn_rejects_bad_numbers_before_any_storage_call() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    // no expectations are set up: a storage call would panic the mock
    let (status, _) = post_plain(&token, "/api/user/orders", "12345678901", |cfg| {
        register_orders(cfg, MockBackend::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn empty_bodies_are_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_plain(&token, "/api/user/orders", "  ", |cfg| {
        register_orders(cfg, MockBackend::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn orders_require_authentication() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/api/user/orders", configure_listing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = post_plain("", "/api/user/orders", "12345678903", configure_fresh_upload).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_shows_accrual_only_for_processed_orders() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, body) = get_request(&token, "/api/user/orders", configure_listing).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"[{"number":"12345678903","status":"PROCESSED","accrual":100.5,"uploaded_at":"2024-02-29T13:30:00Z"},{"number":"79927398713","status":"NEW","uploaded_at":"2024-02-29T13:30:00Z"}]"#
    );
}

#[actix_web::test]
async fn an_empty_listing_is_no_content() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, body) = get_request(&token, "/api/user/orders", configure_empty_listing).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}
