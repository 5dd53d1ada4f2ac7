//! JWT authentication middleware
//!
//! Validates the access token and exposes the caller's identity to handlers
//! as a [`RequestContext`](crate::models::users::RequestContext) request
//! extension. The token's `sub` and `role` claims are trusted as issued; no
//! database lookup happens here.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::{
    error::Result,
    services::{cookies::ACCESS_TOKEN_COOKIE, jwt::authenticate},
    state::AppState,
};

/// JWT authentication middleware
///
/// # Token Sources
/// - **Authorization header** (API clients): `Bearer <token>`
/// - **Cookie** (browser clients): `access_token=<token>`
///
/// The header takes priority. Missing, invalid or expired tokens yield 401.
///
/// # Usage
/// ```ignore
/// Router::new()
///     .route("/me", get(me))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         jwt_auth_middleware,
///     ))
/// ```
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());

    let cookie_header = headers.get("cookie").and_then(|h| h.to_str().ok());
    let access_token = cookie_header.and_then(|h| extract_cookie_value(h, ACCESS_TOKEN_COOKIE));

    let ctx = authenticate(
        auth_header,
        access_token.as_deref(),
        state.config.jwt.secret.expose_secret(),
    )?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Value of the cookie named exactly `cookie_name` in a `Cookie` header.
fn extract_cookie_value(cookie_str: &str, cookie_name: &str) -> Option<String> {
    cookie_str
        .split(';')
        .map(|s| s.trim())
        .find_map(|cookie| {
            cookie
                .split_once('=')
                .filter(|(name, _)| *name == cookie_name)
                .map(|(_, value)| value.to_string())
        })
}
