use axum::{
    Extension,
    extract::State,
    http::{HeaderValue, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;

use crate::{
    error::Result,
    handlers::acquire_conn,
    models::users::{ForgotPassword, LoginUser, PublicUser, RegisterDentist, RequestContext},
    services::{
        cookies::{CookieConfig, build_access_token_cookie, build_clear_token_cookie},
        users,
    },
    state::AppState,
};

/// JSON body plus a `Set-Cookie` header
pub struct CookieResponse {
    json_body: serde_json::Value,
    cookie: String,
}

impl IntoResponse for CookieResponse {
    fn into_response(self) -> Response {
        let (mut parts, body) = Json(self.json_body).into_response().into_parts();

        if let Ok(cookie) = HeaderValue::from_str(&self.cookie) {
            parts.headers.append(SET_COOKIE, cookie);
        }

        Response::from_parts(parts, body)
    }
}

/// POST /api/v1/auth/signup
///
/// Public dentist registration.
///
/// # Request Body
/// - `name`: Display name
/// - `email`: Email address (must be unique)
/// - `password`: At least 6 characters, no spaces
///
/// # HTTP Status Codes
/// - `200 OK`: Dentist registered
/// - `400 BAD_REQUEST`: Validation error
/// - `409 CONFLICT`: Email already registered
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<RegisterDentist>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let user = users::register_dentist(&mut conn, request).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "user": PublicUser::from(user)
    })))
}

/// POST /api/v1/auth/login
///
/// Authenticates with email and password, optionally restricted to a role
/// (the patient portal logs in with `"role": "patient"`).
///
/// # Returns
/// - `user`: Public user object
/// - `access_token`: JWT carrying the user id and role
/// - `expires_at`: ISO 8601 expiration of the token
///
/// Also sets the `access_token` cookie (HttpOnly, SameSite=Lax).
///
/// # HTTP Status Codes
/// - `200 OK`: Authentication successful
/// - `401 UNAUTHORIZED`: Invalid email or password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginUser>,
) -> Result<CookieResponse> {
    let mut conn = acquire_conn(&state).await?;

    let login_result = users::login(&mut conn, &state.config.jwt, request).await?;

    let max_age = (login_result.expires_at - Utc::now()).num_seconds();
    let cookie = build_access_token_cookie(
        &login_result.access_token,
        max_age,
        &CookieConfig::from(&state.config.jwt),
    );

    Ok(CookieResponse {
        json_body: serde_json::json!({
            "ok": true,
            "user": login_result.user,
            "access_token": login_result.access_token,
            "expires_at": login_result.expires_at
        }),
        cookie,
    })
}

/// POST /api/v1/auth/logout
///
/// Clears the access token cookie. Tokens are stateless, so API clients
/// simply discard theirs.
pub async fn logout(State(state): State<AppState>) -> CookieResponse {
    CookieResponse {
        json_body: serde_json::json!({ "ok": true }),
        cookie: build_clear_token_cookie(&CookieConfig::from(&state.config.jwt)),
    }
}

/// POST /api/v1/auth/forgot
///
/// Emails a new password to a patient. Always answers `{"ok": true}` so the
/// endpoint cannot be used to probe which emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPassword>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    users::reset_password(&mut conn, state.mailer.as_ref(), &request.email).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET /api/v1/me
///
/// Profile of the authenticated caller.
///
/// # HTTP Status Codes
/// - `200 OK`: Profile returned
/// - `401 UNAUTHORIZED`: Missing or invalid token
/// - `404 NOT_FOUND`: The account behind the token no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let user = users::get_profile(&mut conn, ctx.user_id).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "user": user
    })))
}
