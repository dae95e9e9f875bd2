use std::{
    fmt,
    fmt::{Debug, Display},
    future::{ready, Ready},
};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

const TOKEN_VALIDITY_HOURS: i64 = 24;

/// The HS256 key material behind `JWT_SECRET`.
///
/// `Debug` and `Display` are redacted so the key cannot leak through config dumps or log lines; the raw bytes are
/// only ever handed to the JWT codec inside [`TokenIssuer`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// The access-token payload. Handlers that declare a `JwtClaims` parameter are bearer-protected: the extractor
/// validates the `Authorization` header and answers 401 on any failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub username: String,
    pub exp: i64,
}

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(key: &SigningKey) -> Self {
        let bytes = key.as_bytes();
        Self { encoding_key: EncodingKey::from_secret(bytes), decoding_key: DecodingKey::from_secret(bytes) }
    }

    pub fn issue_token(&self, username: &str) -> Result<String, ServerError> {
        let exp = (Utc::now() + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp();
        let claims = JwtClaims { username: username.to_string(), exp };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Unspecified(format!("Could not sign access token: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, ServerError> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ServerError::Unauthorized(e.to_string()))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req))
    }
}

fn extract_claims(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::Unspecified("TokenIssuer is not configured".to_string()))?;
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized("No bearer token was provided".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::Unauthorized("Malformed Authorization header".to_string()))?;
    let claims = issuer.validate_token(token)?;
    debug!("💻️ Bearer token accepted for {}", claims.username);
    Ok(claims)
}

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ServerError::Unspecified(format!("Could not hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServerError> {
    bcrypt::verify(password, hash).map_err(|e| ServerError::Unspecified(format!("Could not verify password: {e}")))
}
