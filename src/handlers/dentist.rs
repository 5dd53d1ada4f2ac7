//! Dentist area: patients, direct scheduling and clinical records.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use uuid::Uuid;

use crate::{
    error::{Error, Result, ValidationErrors},
    handlers::{UploadedFile, acquire_conn, form_error},
    models::{
        records::{AnamnesisNote, RecordKind, RecordsQuery},
        scheduling::ScheduleRequest,
        users::{CreatePatient, RequestContext, Role},
    },
    services::{records, scheduling, uploads::PHOTOS_DIR, users},
    state::AppState,
    validation::{optional_trimmed, parse_slot, require_id},
};

// ============================================================================
// Patients
// ============================================================================

/// GET /api/v1/dentist/patients
///
/// Patients owned by the caller plus unowned clinic patients, by name.
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let patients = users::list_patients_for_dentist(&mut conn, &ctx).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "patients": patients
    })))
}

/// Text fields and optional photo of the patient form.
async fn read_patient_form(mut multipart: Multipart) -> Result<(CreatePatient, Option<UploadedFile>)> {
    let mut form = CreatePatient::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            photo = Some(UploadedFile::read(field).await?);
            continue;
        }

        let value = field.text().await.map_err(form_error)?;
        match name.as_str() {
            "name" => form.name = value,
            "email" => form.email = value,
            "password" => form.password = Some(value),
            "phone" => form.phone = Some(value),
            "age" => {
                form.age = optional_trimmed(Some(value))
                    .map(|age| age.parse::<i32>())
                    .transpose()
                    .map_err(|_| {
                        Error::Validation(ValidationErrors::single("age", "Age must be a whole number"))
                    })?;
            }
            _ => {}
        }
    }

    Ok((form, photo))
}

/// POST /api/v1/dentist/patients
///
/// Creates a patient owned by the calling dentist from a multipart form.
///
/// # Form Fields
/// - `name`, `email`: required
/// - `password`: optional; a temporary one is generated when blank
/// - `age`, `phone`: optional
/// - `photo`: optional png/jpg/jpeg/webp/gif image
///
/// The patient receives an email that the account exists (best effort).
///
/// # HTTP Status Codes
/// - `200 OK`: Patient created
/// - `400 BAD_REQUEST`: Validation error
/// - `409 CONFLICT`: Email already registered
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let (mut form, photo) = read_patient_form(multipart).await?;
    users::check_new_patient(&form)?;

    if let Some(photo) = photo {
        form.photo = state
            .uploads
            .save_image(PHOTOS_DIR, photo.file_name.as_deref(), &photo.content)
            .await?;
    }
    let stored_photo = form.photo.clone();

    let created = match acquire_conn(&state).await {
        Ok(mut conn) => {
            users::create_patient(
                &mut conn,
                state.mailer.as_ref(),
                &state.config.mail,
                &ctx,
                form,
            )
            .await
        }
        Err(e) => Err(e),
    };

    let account = match created {
        Ok(account) => account,
        Err(e) => {
            if let Some(path) = stored_photo {
                if let Err(remove_err) = state.uploads.remove(&path).await {
                    tracing::warn!(%path, error = %remove_err, "failed to remove orphaned photo");
                }
            }
            return Err(e);
        }
    };

    Ok(Json(serde_json::json!({
        "ok": true,
        "user": account.user,
        "temporary_password": account.temporary_password
    })))
}

// ============================================================================
// Appointments
// ============================================================================

/// GET /api/v1/dentist/appointments
///
/// The caller's appointments with patient names, by date and time.
pub async fn list_dentist_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let appointments = scheduling::list_appointments(&mut conn, ctx.user_id, Role::Dentist).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "appointments": appointments
    })))
}

/// POST /api/v1/dentist/schedule
///
/// Books a visible patient directly into the caller's agenda. No
/// availability is required. The patient is emailed on success.
///
/// # HTTP Status Codes
/// - `200 OK`: Appointment created
/// - `400 BAD_REQUEST`: Missing or malformed `patient_id`, `date`, `time`
/// - `404 NOT_FOUND`: Patient unknown or not visible to the caller
/// - `409 CONFLICT`: Slot already occupied (`"msg": "ocupado"`)
pub async fn schedule_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<serde_json::Value>> {
    let patient_id = require_id(request.patient_id, "patient_id")?;
    let (date, time) = parse_slot(request.date.as_deref(), request.time.as_deref())?;

    let mut conn = acquire_conn(&state).await?;
    let appointment = scheduling::schedule_for_patient(
        &mut conn,
        state.mailer.as_ref(),
        &ctx,
        patient_id,
        date,
        time,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "appointment": appointment
    })))
}

// ============================================================================
// Clinical records
// ============================================================================

/// GET /api/v1/dentist/patients/{id}
///
/// One visible patient with their records, newest first.
///
/// # HTTP Status Codes
/// - `200 OK`: `{ok, patient, records}`
/// - `404 NOT_FOUND`: Unknown patient, or not visible to the caller
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let chart = records::patient_chart(&mut conn, &ctx, patient_id).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "patient": chart.patient,
        "records": chart.records
    })))
}

/// GET /api/v1/dentist/patients/{id}/records?kind=
///
/// A visible patient's records, newest first.
pub async fn list_patient_records(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<Uuid>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let records = records::list_records(&mut conn, &ctx, patient_id, query.kind).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "records": records
    })))
}

/// POST /api/v1/dentist/patients/{id}/anamnesis
///
/// Appends a written anamnesis note (`content`, optional `assessment`).
pub async fn add_anamnesis(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<Uuid>,
    Json(note): Json<AnamnesisNote>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = acquire_conn(&state).await?;

    let record = records::add_anamnesis_note(&mut conn, &ctx, patient_id, note).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "record": record
    })))
}

/// POST /api/v1/dentist/patients/{id}/records/{kind}
///
/// Uploads a scanned anamnesis form or clinical sheet (multipart field
/// `image`). `kind` is `anamnesis` or `clinical_sheet`.
///
/// # HTTP Status Codes
/// - `200 OK`: Image stored and recorded
/// - `400 BAD_REQUEST`: No image, or an unsupported file type
/// - `404 NOT_FOUND`: Patient unknown or not visible to the caller
pub async fn upload_record(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((patient_id, kind)): Path<(Uuid, RecordKind)>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() == Some("image") {
            image = Some(UploadedFile::read(field).await?);
        }
    }
    let image = image.ok_or_else(|| Error::ValidationMissing("image".to_string()))?;

    let mut conn = acquire_conn(&state).await?;
    let record = records::upload_record_image(
        &mut conn,
        &state.uploads,
        &ctx,
        patient_id,
        kind,
        image.file_name.as_deref(),
        &image.content,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "record": record
    })))
}
