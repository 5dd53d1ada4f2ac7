//! Patient portal: own appointments and records, self-booking.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    error::Result,
    handlers::acquire_conn,
    models::{
        records::RecordsQuery,
        scheduling::{CalendarEvent, IdRequest, SlotRequest},
        users::{RequestContext, Role},
    },
    services::{records, scheduling},
    state::AppState,
    validation::{parse_slot, require_id},
};

/// GET /api/v1/patient/appointments
pub async fn list_patient_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let appointments = scheduling::list_appointments(&mut conn, ctx.user_id, Role::Patient).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "appointments": appointments
    })))
}

/// GET /api/v1/patient/records?kind=
pub async fn list_own_records(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let records = records::list_records(&mut conn, &ctx, ctx.user_id, query.kind).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "records": records
    })))
}

/// GET /api/patient_slots
///
/// Free slots ("Livre") of the caller's dentist.
pub async fn patient_slots(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<CalendarEvent>>> {
    let mut conn = acquire_conn(&state).await?;

    let events = scheduling::patient_slot_events(&mut conn, &ctx).await?;

    Ok(Json(events))
}

/// GET /api/patient_events
///
/// The caller's appointments as "Consulta - <dentist>" events.
pub async fn patient_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<CalendarEvent>>> {
    let mut conn = acquire_conn(&state).await?;

    let events = scheduling::patient_events(&mut conn, ctx.user_id).await?;

    Ok(Json(events))
}

/// POST /api/book
///
/// Books a slot with the caller's dentist, who is emailed on success.
///
/// # HTTP Status Codes
/// - `200 OK`: `{"ok": true}`
/// - `400 BAD_REQUEST`: `date` or `time` missing or malformed
/// - `404 NOT_FOUND`: The clinic has no dentist yet
/// - `409 CONFLICT`: `{"ok": false, "msg": "ocupado"}`
pub async fn book(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<SlotRequest>,
) -> Result<Json<serde_json::Value>> {
    let (date, time) = parse_slot(request.date.as_deref(), request.time.as_deref())?;

    let mut conn = acquire_conn(&state).await?;
    let appointment =
        scheduling::book_for_patient(&mut conn, state.mailer.as_ref(), &ctx, date, time).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "id": appointment.id
    })))
}

/// POST /api/patient_cancel
///
/// # HTTP Status Codes
/// - `200 OK`: `{"ok": true}`
/// - `404 NOT_FOUND`: `{"ok": false}`; not the caller's appointment
pub async fn patient_cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<IdRequest>,
) -> Result<Json<serde_json::Value>> {
    let id = require_id(request.id, "id")?;

    let mut conn = acquire_conn(&state).await?;
    scheduling::cancel_appointment(&mut conn, id, &ctx).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
