use crate::{
    error::Result,
    models::records::{ClinicalRecord, NewClinicalRecord, RecordKind},
};
use sqlx::Postgres;
use uuid::Uuid;

use crate::DbConn;

/// Appends a clinical record for a patient.
pub async fn create_record(conn: &mut DbConn, new_record: NewClinicalRecord) -> Result<ClinicalRecord> {
    let record = sqlx::query_as::<Postgres, ClinicalRecord>(
        r#"
        INSERT INTO clinical_records (patient_id, kind, content, assessment, image_path, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, patient_id, kind, content, assessment, image_path, created_by, created_at
        "#,
    )
    .bind(new_record.patient_id)
    .bind(new_record.kind)
    .bind(&new_record.content)
    .bind(&new_record.assessment)
    .bind(&new_record.image_path)
    .bind(new_record.created_by)
    .fetch_one(conn)
    .await?;

    Ok(record)
}

/// Lists a patient's records newest first, optionally of one kind.
pub async fn list_records(
    conn: &mut DbConn,
    patient_id: Uuid,
    kind: Option<RecordKind>,
) -> Result<Vec<ClinicalRecord>> {
    let records = sqlx::query_as::<Postgres, ClinicalRecord>(
        r#"
        SELECT id, patient_id, kind, content, assessment, image_path, created_by, created_at
        FROM clinical_records
        WHERE patient_id = $1 AND ($2::text IS NULL OR kind = $2)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(patient_id)
    .bind(kind)
    .fetch_all(conn)
    .await?;

    Ok(records)
}
