use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_engine::{traits::UserApiError, IdentityApi};

use super::{
    helpers::{post_json, post_json_raw, user_record},
    mocks::MockBackend,
};
use crate::routes::{LoginRoute, RegisterRoute};

fn configure_register_ok(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_add_user().returning(|login, _hash| Ok(user_record(login, 0.0)));
    cfg.service(RegisterRoute::<MockBackend>::new()).app_data(web::Data::new(IdentityApi::new(backend)));
}

fn configure_register_conflict(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_add_user().returning(|_, _| Err(UserApiError::AlreadyExists));
    cfg.service(RegisterRoute::<MockBackend>::new()).app_data(web::Data::new(IdentityApi::new(backend)));
}

fn configure_login(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_login().returning(|login| {
        if login == "alice" {
            Ok(Some(user_record(login, 0.0)))
        } else {
            Ok(None)
        }
    });
    cfg.service(LoginRoute::<MockBackend>::new()).app_data(web::Data::new(IdentityApi::new(backend)));
}

#[actix_web::test]
async fn register_issues_a_bearer_token() {
    let _ = env_logger::try_init().ok();
    let (status, auth_header, _) = post_json_raw(
        "",
        "/api/user/register",
        r#"{"login":"alice","password":"password"}"#,
        configure_register_ok,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(auth_header.starts_with("Bearer "), "expected a bearer token, got {auth_header:?}");
}

#[actix_web::test]
async fn register_conflicts_on_taken_login() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_json(
        "",
        "/api/user/register",
        r#"{"login":"alice","password":"password"}"#,
        configure_register_conflict,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn register_rejects_malformed_bodies() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_json("", "/api/user/register", r#"{"login":"alice"}"#, configure_register_ok).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) =
        post_json("", "/api/user/register", r#"{"login":"","password":""}"#, configure_register_ok).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_issues_a_bearer_token() {
    let _ = env_logger::try_init().ok();
    let (status, auth_header, _) =
        post_json_raw("", "/api/user/login", r#"{"login":"alice","password":"password"}"#, configure_login).await;
    assert_eq!(status, StatusCode::OK);
    assert!(auth_header.starts_with("Bearer "));
}

#[actix_web::test]
async fn login_rejects_a_wrong_password() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_json("", "/api/user/login", r#"{"login":"alice","password":"nope"}"#, configure_login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_rejects_an_unknown_user_identically() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_json("", "/api/user/login", r#"{"login":"mallory","password":"password"}"#, configure_login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid login or password");
}
