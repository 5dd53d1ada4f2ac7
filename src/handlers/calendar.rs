//! JSON endpoints behind the dentist's calendar widget.
//!
//! Request and response shapes follow the widget: bodies are `{date, time}`
//! or `{id}`, answers `{"ok": true}` or `{"ok": false, "msg": ...}`.

use axum::{Extension, Json, extract::State};

use crate::{
    error::Result,
    handlers::acquire_conn,
    models::{
        scheduling::{CalendarEvent, IdRequest, SlotRequest},
        users::RequestContext,
    },
    services::scheduling,
    state::AppState,
    validation::{parse_slot, require_id},
};

/// GET /api/dentist_events
///
/// Availabilities (green, "Disponível") and appointments (red,
/// "Agendado: <patient>") of the caller.
pub async fn dentist_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<CalendarEvent>>> {
    let mut conn = acquire_conn(&state).await?;

    let events = scheduling::dentist_events(&mut conn, ctx.user_id).await?;

    Ok(Json(events))
}

/// POST /api/add_availability
///
/// # HTTP Status Codes
/// - `200 OK`: `{"ok": true}`
/// - `400 BAD_REQUEST`: `date` or `time` missing or malformed
/// - `409 CONFLICT`: `{"ok": false, "msg": "duplicado"}`
pub async fn add_availability(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<SlotRequest>,
) -> Result<Json<serde_json::Value>> {
    let (date, time) = parse_slot(request.date.as_deref(), request.time.as_deref())?;

    let mut conn = acquire_conn(&state).await?;
    let availability = scheduling::add_availability(&mut conn, ctx.user_id, date, time).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "id": availability.id
    })))
}

/// POST /api/remove_availability
///
/// Always `{"ok": true}` once `id` is present; ids that are unknown or belong
/// to another dentist are ignored.
pub async fn remove_availability(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<IdRequest>,
) -> Result<Json<serde_json::Value>> {
    let id = require_id(request.id, "id")?;

    let mut conn = acquire_conn(&state).await?;
    scheduling::remove_availability(&mut conn, id, ctx.user_id).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/cancel_appointment
///
/// # HTTP Status Codes
/// - `200 OK`: `{"ok": true}`
/// - `404 NOT_FOUND`: `{"ok": false}`; the appointment does not exist or is
///   held with another dentist
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<IdRequest>,
) -> Result<Json<serde_json::Value>> {
    let id = require_id(request.id, "id")?;

    let mut conn = acquire_conn(&state).await?;
    scheduling::cancel_appointment(&mut conn, id, &ctx).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
