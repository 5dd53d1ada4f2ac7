use crate::{
    error::{Error, Result},
    models::scheduling::{Appointment, AppointmentView, NewAppointment},
    queries::is_unique_violation,
};
use sqlx::Postgres;
use uuid::Uuid;

use crate::DbConn;

/// Inserts an appointment. The insert is the conflict check: a concurrent or
/// earlier booking of the same (dentist, date, time) trips
/// `appointments_slot_key` and surfaces as `SlotOccupied`.
pub async fn create_appointment(conn: &mut DbConn, new_appointment: NewAppointment) -> Result<Appointment> {
    let appointment = sqlx::query_as::<Postgres, Appointment>(
        r#"
        INSERT INTO appointments (patient_id, dentist_id, date, time)
        VALUES ($1, $2, $3, $4)
        RETURNING id, patient_id, dentist_id, date, time, created_at
        "#,
    )
    .bind(new_appointment.patient_id)
    .bind(new_appointment.dentist_id)
    .bind(new_appointment.date)
    .bind(new_appointment.time)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "appointments_slot_key") {
            Error::SlotOccupied
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(appointment)
}

/// Deletes an appointment booked by `patient_id`.
pub async fn delete_appointment_for_patient(conn: &mut DbConn, id: Uuid, patient_id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM appointments WHERE id = $1 AND patient_id = $2")
        .bind(id)
        .bind(patient_id)
        .execute(conn)
        .await?
        .rows_affected();

    Ok(rows_affected)
}

/// Deletes an appointment held with `dentist_id`.
pub async fn delete_appointment_for_dentist(conn: &mut DbConn, id: Uuid, dentist_id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM appointments WHERE id = $1 AND dentist_id = $2")
        .bind(id)
        .bind(dentist_id)
        .execute(conn)
        .await?
        .rows_affected();

    Ok(rows_affected)
}

/// Deletes an appointment regardless of ownership.
pub async fn delete_appointment(conn: &mut DbConn, id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();

    Ok(rows_affected)
}

/// A dentist's appointments joined with the patient's name.
pub async fn list_appointments_for_dentist(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<AppointmentView>> {
    let appointments = sqlx::query_as::<Postgres, AppointmentView>(
        r#"
        SELECT ap.id, ap.patient_id, ap.dentist_id, ap.date, ap.time, p.name AS counterpart_name
        FROM appointments ap
        JOIN users p ON p.id = ap.patient_id
        WHERE ap.dentist_id = $1
        ORDER BY ap.date ASC, ap.time ASC
        "#,
    )
    .bind(dentist_id)
    .fetch_all(conn)
    .await?;

    Ok(appointments)
}

/// A patient's appointments joined with the dentist's name.
pub async fn list_appointments_for_patient(conn: &mut DbConn, patient_id: Uuid) -> Result<Vec<AppointmentView>> {
    let appointments = sqlx::query_as::<Postgres, AppointmentView>(
        r#"
        SELECT ap.id, ap.patient_id, ap.dentist_id, ap.date, ap.time, d.name AS counterpart_name
        FROM appointments ap
        JOIN users d ON d.id = ap.dentist_id
        WHERE ap.patient_id = $1
        ORDER BY ap.date ASC, ap.time ASC
        "#,
    )
    .bind(patient_id)
    .fetch_all(conn)
    .await?;

    Ok(appointments)
}
