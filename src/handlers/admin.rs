use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    error::Result,
    handlers::acquire_conn,
    models::users::{CreateUser, ListUsersQuery},
    services::users,
    state::AppState,
};

/// GET /api/v1/admin/users?role=
///
/// Lists accounts ordered by name, optionally filtered by role.
///
/// # HTTP Status Codes
/// - `200 OK`: Users returned
/// - `401 UNAUTHORIZED` / `403 FORBIDDEN`: Not an admin
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let users = users::list_users(&mut conn, query.role).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "users": users
    })))
}

/// POST /api/v1/admin/users
///
/// Creates an account of any role. When `password` is omitted a temporary
/// one (`Temp` + 6 hex digits) is generated and returned once as
/// `temporary_password`.
///
/// # HTTP Status Codes
/// - `200 OK`: Account created
/// - `400 BAD_REQUEST`: Validation error
/// - `409 CONFLICT`: Email already registered
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let account = users::create_user(&mut conn, request).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "user": account.user,
        "temporary_password": account.temporary_password
    })))
}
