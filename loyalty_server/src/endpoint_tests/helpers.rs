use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use lpg_common::Points;
use loyalty_engine::db_types::{Order, OrderNumber, OrderStatus, UserRecord};

use crate::auth::{SigningKey, TokenIssuer};

/// Every endpoint test signs and validates with this issuer. DO NOT re-use the key anywhere.
pub fn test_signer() -> TokenIssuer {
    TokenIssuer::new(&SigningKey::new("endpoint-test-signing-key"))
}

pub fn valid_token(username: &str) -> String {
    test_signer().issue_token(username).expect("Failed to issue test token")
}

/// A user whose password is literally "password" (hashed at the cheapest bcrypt cost to keep tests fast).
pub fn user_record(login: &str, balance: f64) -> UserRecord {
    UserRecord {
        id: format!("id-{login}"),
        login: login.to_string(),
        password: bcrypt::hash("password", 4).expect("Failed to hash test password"),
        balance: Points::try_from(balance).unwrap(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn order(number: &str, user_id: &str, status: OrderStatus, accrual: f64) -> Order {
    Order {
        number: OrderNumber::from(number),
        user_id: user_id.to_string(),
        status,
        accrual: Points::try_from(accrual).unwrap(),
        retry_count: 0,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

pub async fn get_request(token: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let (status, _, body) = call(req, configure).await;
    (status, body)
}

pub async fn post_json(
    token: &str,
    path: &str,
    json: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let (status, _, body) = post_json_raw(token, path, json, configure).await;
    (status, body)
}

/// Like [`post_json`], but also returns the `Authorization` response header (empty when absent).
pub async fn post_json_raw(
    token: &str,
    path: &str,
    json: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String, String) {
    let mut req =
        TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(json.to_string());
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    call(req, configure).await
}

pub async fn post_plain(
    token: &str,
    path: &str,
    body: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req =
        TestRequest::post().uri(path).insert_header(ContentType::plaintext()).set_payload(body.to_string());
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let (status, _, body) = call(req, configure).await;
    (status, body)
}

async fn call(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String, String) {
    let app = App::new().app_data(web::Data::new(test_signer())).configure(configure);
    let service = test::init_service(app).await;
    let response = test::call_service(&service, req.to_request()).await;
    let status = response.status();
    let auth_header = response
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = String::from_utf8_lossy(&response.into_body().try_into_bytes().unwrap()).into_owned();
    (status, auth_header, body)
}
