//! Role guard applied after [`jwt_auth_middleware`](super::jwt_auth_middleware).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{Error, Result},
    models::users::{RequestContext, Role},
};

/// Rejects callers whose role does not permit `required`. Admins pass every
/// guard.
///
/// # Usage
/// ```ignore
/// Router::new()
///     .route("/dentist/patients", get(list_patients))
///     .route_layer(middleware::from_fn_with_state(Role::Dentist, role_guard_middleware))
///     .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
/// ```
pub async fn role_guard_middleware(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .copied()
        .ok_or_else(|| Error::Authentication("Missing access token".to_string()))?;

    if !ctx.role.permits(required) {
        tracing::debug!(user_id = %ctx.user_id, role = %ctx.role, %required, "role guard rejected request");
        return Err(Error::Forbidden(format!("This area requires the {} role", required)));
    }

    Ok(next.run(request).await)
}
