//! Stateless access tokens (HS256).
//!
//! A token names the account and its role, so authenticated requests need no
//! database round trip. There is no refresh flow: clients log in again once
//! the token expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::users::{RequestContext, Role},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl AccessClaims {
    /// The caller identity carried by these claims.
    pub fn context(&self) -> Result<RequestContext> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Authentication("Invalid subject in token".to_string()))?;
        Ok(RequestContext::new(user_id, self.role))
    }
}

/// Signs an access token valid for `ttl_minutes` and returns it with its
/// expiry.
pub fn issue_access_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    ttl_minutes: i64,
) -> Result<(String, DateTime<Utc>)> {
    let issued_at = Utc::now();
    let expires_at = issued_at + Duration::minutes(ttl_minutes);

    let claims = AccessClaims {
        sub: user_id.to_string(),
        role,
        exp: expires_at.timestamp(),
        iat: issued_at.timestamp(),
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| Error::Internal(format!("Failed to sign access token: {}", e)))?;

    Ok((token, expires_at))
}

/// Checks signature and expiry and returns the claims.
pub fn decode_access_token(token: &str, secret: &str) -> Result<AccessClaims> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        let msg = match e.kind() {
            ErrorKind::ExpiredSignature => "Token has expired".to_string(),
            ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
            _ => format!("Invalid token: {}", e),
        };
        Error::Authentication(msg)
    })?;

    Ok(data.claims)
}

/// Authenticates a request from its `Authorization` header or, when that
/// header is absent, its access token cookie.
pub fn authenticate(
    authorization: Option<&str>,
    cookie_token: Option<&str>,
    secret: &str,
) -> Result<RequestContext> {
    let token = match authorization {
        Some(header) => bearer_token(header)?,
        None => cookie_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Authentication("Missing access token".to_string()))?,
    };

    decode_access_token(token, secret)?.context()
}

fn bearer_token(header: &str) -> Result<&str> {
    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        Error::Authentication("Expected 'Authorization: Bearer <token>'".to_string())
    })?;

    if token.trim().is_empty() {
        return Err(Error::Authentication("Empty bearer token".to_string()));
    }
    Ok(token.trim())
}
