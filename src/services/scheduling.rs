//! Scheduling store: dentist availabilities and patient appointments.
//!
//! Double booking is ruled out by the `(dentist_id, date, time)` unique
//! constraints alone. Inserts are never preceded by an existence check, so
//! of two concurrent bookings for one slot exactly one row is written and
//! the other caller receives `SlotOccupied`.

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;

use crate::DbConn;
use crate::{
    error::{Error, Result},
    models::{
        scheduling::{
            Appointment, AppointmentView, Availability, CalendarEvent, NewAppointment,
            NewAvailability, event_start,
        },
        users::{RequestContext, Role, User},
    },
    queries::{appointments, availabilities, users},
    services::{
        notifications::{self, Mailer},
        users::get_visible_patient,
    },
    validation::slot_minute,
};

const AVAILABLE_COLOR: &str = "#28a745";
const BOOKED_COLOR: &str = "#dc3545";

// ============================================================================
// Store operations
// ============================================================================

/// Declares a slot as open. A repeated slot fails with `DuplicateSlot`.
pub async fn add_availability(
    conn: &mut DbConn,
    dentist_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Availability> {
    let time = slot_minute(time);
    let availability = availabilities::create_availability(
        conn,
        NewAvailability {
            dentist_id,
            date,
            time,
        },
    )
    .await?;

    tracing::info!(%dentist_id, %date, %time, "availability added");
    Ok(availability)
}

/// Removes an availability owned by the dentist. Unknown or foreign ids are
/// ignored.
pub async fn remove_availability(conn: &mut DbConn, id: Uuid, dentist_id: Uuid) -> Result<()> {
    let removed = availabilities::delete_availability(conn, id, dentist_id).await?;
    tracing::debug!(%id, %dentist_id, removed, "remove availability");
    Ok(())
}

/// Availabilities of a dentist with no appointment at the same slot,
/// ordered by date then time.
pub async fn list_free_slots(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<Availability>> {
    availabilities::list_free_availabilities(conn, dentist_id).await
}

/// Books a slot. No availability row is required; an existing appointment
/// at the same slot yields `SlotOccupied`.
pub async fn book_appointment(
    conn: &mut DbConn,
    patient_id: Uuid,
    dentist_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Appointment> {
    let time = slot_minute(time);
    let result = appointments::create_appointment(
        conn,
        NewAppointment {
            patient_id,
            dentist_id,
            date,
            time,
        },
    )
    .await;

    match &result {
        Ok(appointment) => {
            tracing::info!(appointment_id = %appointment.id, %patient_id, %dentist_id, %date, %time, "appointment booked")
        }
        Err(Error::SlotOccupied) => {
            tracing::info!(%patient_id, %dentist_id, %date, %time, "slot already occupied")
        }
        Err(_) => {}
    }

    result
}

/// Cancels an appointment the requester takes part in.
///
/// Ownership is part of the delete itself; when no row matches, nothing is
/// removed and the call fails with `NotFoundOrForbidden`.
pub async fn cancel_appointment(conn: &mut DbConn, id: Uuid, ctx: &RequestContext) -> Result<()> {
    let removed = match ctx.role {
        Role::Patient => appointments::delete_appointment_for_patient(conn, id, ctx.user_id).await?,
        Role::Dentist => appointments::delete_appointment_for_dentist(conn, id, ctx.user_id).await?,
        Role::Admin => appointments::delete_appointment(conn, id).await?,
    };

    if removed == 0 {
        return Err(Error::NotFoundOrForbidden("Appointment not found".to_string()));
    }

    tracing::info!(appointment_id = %id, user_id = %ctx.user_id, role = %ctx.role, "appointment cancelled");
    Ok(())
}

/// Appointments seen from one side: a dentist's (with patient names) or a
/// patient's (with dentist names).
pub async fn list_appointments(conn: &mut DbConn, for_id: Uuid, role: Role) -> Result<Vec<AppointmentView>> {
    match role {
        Role::Dentist => appointments::list_appointments_for_dentist(conn, for_id).await,
        Role::Patient => appointments::list_appointments_for_patient(conn, for_id).await,
        Role::Admin => Err(Error::Forbidden(
            "Appointments are listed per dentist or patient".to_string(),
        )),
    }
}

// ============================================================================
// Booking paths
// ============================================================================

/// The dentist a patient books with: the owning dentist, otherwise the
/// clinic's first registered dentist.
pub async fn resolve_dentist(conn: &mut DbConn, patient: &User) -> Result<User> {
    if let Some(owner_id) = patient.dentist_id {
        if let Some(owner) = users::get_user_by_id(conn, owner_id).await? {
            return Ok(owner);
        }
    }

    users::get_default_dentist(conn)
        .await?
        .ok_or_else(|| Error::NotFound("No dentist available".to_string()))
}

async fn load_patient(conn: &mut DbConn, ctx: &RequestContext) -> Result<User> {
    let user = users::get_user_by_id(conn, ctx.user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User with ID {} not found", ctx.user_id)))?;

    if user.role != Role::Patient {
        return Err(Error::Forbidden("Only patients can book appointments".to_string()));
    }

    Ok(user)
}

/// A dentist schedules a visible patient directly; the patient is emailed.
pub async fn schedule_for_patient(
    conn: &mut DbConn,
    mailer: &dyn Mailer,
    ctx: &RequestContext,
    patient_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Appointment> {
    let patient = get_visible_patient(conn, ctx, patient_id).await?;

    let dentist = if ctx.role == Role::Dentist {
        users::get_user_by_id(conn, ctx.user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User with ID {} not found", ctx.user_id)))?
    } else {
        resolve_dentist(conn, &patient).await?
    };

    let appointment = book_appointment(conn, patient.id, dentist.id, date, time).await?;

    notifications::notify(
        mailer,
        notifications::scheduled_notice(
            &patient.name,
            &dentist.name,
            &date.format("%Y-%m-%d").to_string(),
            &time.format("%H:%M").to_string(),
            &patient.email,
        ),
    )
    .await;

    Ok(appointment)
}

/// A patient books a slot with their dentist; the dentist is emailed.
pub async fn book_for_patient(
    conn: &mut DbConn,
    mailer: &dyn Mailer,
    ctx: &RequestContext,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Appointment> {
    let patient = load_patient(conn, ctx).await?;
    let dentist = resolve_dentist(conn, &patient).await?;

    let appointment = book_appointment(conn, patient.id, dentist.id, date, time).await?;

    notifications::notify(
        mailer,
        notifications::booking_notice(
            &patient.name,
            &date.format("%Y-%m-%d").to_string(),
            &time.format("%H:%M").to_string(),
            &dentist.email,
        ),
    )
    .await;

    Ok(appointment)
}

// ============================================================================
// Calendar feeds
// ============================================================================

pub fn availability_event(availability: &Availability) -> CalendarEvent {
    CalendarEvent {
        id: format!("a{}", availability.id),
        title: "Disponível".to_string(),
        start: event_start(availability.date, availability.time),
        color: Some(AVAILABLE_COLOR.to_string()),
        extended_props: Some(json!({ "type": "avail", "id": availability.id })),
    }
}

pub fn dentist_appointment_event(appointment: &AppointmentView) -> CalendarEvent {
    CalendarEvent {
        id: format!("ap{}", appointment.id),
        title: format!("Agendado: {}", appointment.counterpart_name),
        start: event_start(appointment.date, appointment.time),
        color: Some(BOOKED_COLOR.to_string()),
        extended_props: Some(json!({ "type": "appt", "id": appointment.id })),
    }
}

pub fn free_slot_event(slot: &Availability) -> CalendarEvent {
    CalendarEvent {
        id: slot.id.to_string(),
        title: "Livre".to_string(),
        start: event_start(slot.date, slot.time),
        color: None,
        extended_props: Some(json!({
            "date": slot.date.format("%Y-%m-%d").to_string(),
            "time": slot.time.format("%H:%M").to_string(),
        })),
    }
}

pub fn patient_appointment_event(appointment: &AppointmentView) -> CalendarEvent {
    CalendarEvent {
        id: appointment.id.to_string(),
        title: format!("Consulta - {}", appointment.counterpart_name),
        start: event_start(appointment.date, appointment.time),
        color: None,
        extended_props: None,
    }
}

/// A dentist's availabilities followed by their appointments.
pub async fn dentist_events(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<CalendarEvent>> {
    let availabilities = availabilities::list_availabilities(conn, dentist_id).await?;
    let appointments = appointments::list_appointments_for_dentist(conn, dentist_id).await?;

    Ok(availabilities
        .iter()
        .map(availability_event)
        .chain(appointments.iter().map(dentist_appointment_event))
        .collect())
}

/// Free slots of the calling patient's dentist.
pub async fn patient_slot_events(conn: &mut DbConn, ctx: &RequestContext) -> Result<Vec<CalendarEvent>> {
    let patient = load_patient(conn, ctx).await?;
    let dentist = resolve_dentist(conn, &patient).await?;
    let slots = list_free_slots(conn, dentist.id).await?;

    Ok(slots.iter().map(free_slot_event).collect())
}

pub async fn patient_events(conn: &mut DbConn, patient_id: Uuid) -> Result<Vec<CalendarEvent>> {
    let appointments = appointments::list_appointments_for_patient(conn, patient_id).await?;
    Ok(appointments.iter().map(patient_appointment_event).collect())
}
