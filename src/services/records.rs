use uuid::Uuid;

use crate::DbConn;
use crate::{
    error::{Error, Result, ValidationErrors},
    models::{
        records::{AnamnesisNote, ClinicalRecord, NewClinicalRecord, PatientChart, RecordKind},
        users::RequestContext,
    },
    queries::records,
    services::{uploads::UploadStore, users::get_visible_patient},
    validation::{optional_trimmed, require_field},
};

/// Appends a written anamnesis note for a patient visible to the caller.
pub async fn add_anamnesis_note(
    conn: &mut DbConn,
    ctx: &RequestContext,
    patient_id: Uuid,
    note: AnamnesisNote,
) -> Result<ClinicalRecord> {
    let content = require_field(note.content.as_deref(), "content")?.to_string();
    let patient = get_visible_patient(conn, ctx, patient_id).await?;

    let record = records::create_record(
        conn,
        NewClinicalRecord {
            patient_id: patient.id,
            kind: RecordKind::Anamnesis,
            content: Some(content),
            assessment: optional_trimmed(note.assessment),
            image_path: None,
            created_by: Some(ctx.user_id),
        },
    )
    .await?;

    tracing::info!(record_id = %record.id, %patient_id, "anamnesis note added");
    Ok(record)
}

/// Records an already stored image of the given kind.
pub async fn add_record_image(
    conn: &mut DbConn,
    ctx: &RequestContext,
    patient_id: Uuid,
    kind: RecordKind,
    image_path: String,
) -> Result<ClinicalRecord> {
    let patient = get_visible_patient(conn, ctx, patient_id).await?;

    let record = records::create_record(
        conn,
        NewClinicalRecord {
            patient_id: patient.id,
            kind,
            content: None,
            assessment: None,
            image_path: Some(image_path),
            created_by: Some(ctx.user_id),
        },
    )
    .await?;

    tracing::info!(record_id = %record.id, %patient_id, %kind, "record image added");
    Ok(record)
}

/// Stores an uploaded image and records it. Access is checked before
/// anything is written to disk.
pub async fn upload_record_image(
    conn: &mut DbConn,
    uploads: &UploadStore,
    ctx: &RequestContext,
    patient_id: Uuid,
    kind: RecordKind,
    file_name: Option<&str>,
    content: &[u8],
) -> Result<ClinicalRecord> {
    get_visible_patient(conn, ctx, patient_id).await?;

    let image_path = uploads
        .save_image(kind.upload_dir(), file_name, content)
        .await?
        .ok_or_else(|| {
            Error::Validation(ValidationErrors::single(
                "image",
                "Expected a png, jpg, jpeg, webp or gif image",
            ))
        })?;

    add_record_image(conn, ctx, patient_id, kind, image_path).await
}

/// A patient's records, newest first. Patients read their own; dentists
/// those of patients visible to them.
pub async fn list_records(
    conn: &mut DbConn,
    ctx: &RequestContext,
    patient_id: Uuid,
    kind: Option<RecordKind>,
) -> Result<Vec<ClinicalRecord>> {
    let patient = get_visible_patient(conn, ctx, patient_id).await?;
    records::list_records(conn, patient.id, kind).await
}

/// Profile and records of one patient visible to the caller.
pub async fn patient_chart(conn: &mut DbConn, ctx: &RequestContext, patient_id: Uuid) -> Result<PatientChart> {
    let patient = get_visible_patient(conn, ctx, patient_id).await?;
    let records = records::list_records(conn, patient.id, None).await?;

    Ok(PatientChart {
        patient: patient.into(),
        records,
    })
}
