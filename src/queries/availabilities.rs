use crate::{
    error::{Error, Result},
    models::scheduling::{Availability, NewAvailability},
    queries::is_unique_violation,
};
use sqlx::Postgres;
use uuid::Uuid;

use crate::DbConn;

/// Inserts an availability. A second row for the same slot is rejected by
/// `availabilities_slot_key` and surfaces as `DuplicateSlot`.
pub async fn create_availability(conn: &mut DbConn, new_availability: NewAvailability) -> Result<Availability> {
    let availability = sqlx::query_as::<Postgres, Availability>(
        r#"
        INSERT INTO availabilities (dentist_id, date, time)
        VALUES ($1, $2, $3)
        RETURNING id, dentist_id, date, time, created_at
        "#,
    )
    .bind(new_availability.dentist_id)
    .bind(new_availability.date)
    .bind(new_availability.time)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "availabilities_slot_key") {
            Error::DuplicateSlot
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(availability)
}

/// Deletes an availability owned by `dentist_id`. Returns the number of rows removed.
pub async fn delete_availability(conn: &mut DbConn, id: Uuid, dentist_id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query(
        r#"
        DELETE FROM availabilities
        WHERE id = $1 AND dentist_id = $2
        "#,
    )
    .bind(id)
    .bind(dentist_id)
    .execute(conn)
    .await?
    .rows_affected();

    Ok(rows_affected)
}

/// Lists every availability of a dentist, booked or not.
pub async fn list_availabilities(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<Availability>> {
    let availabilities = sqlx::query_as::<Postgres, Availability>(
        r#"
        SELECT id, dentist_id, date, time, created_at
        FROM availabilities
        WHERE dentist_id = $1
        ORDER BY date ASC, time ASC
        "#,
    )
    .bind(dentist_id)
    .fetch_all(conn)
    .await?;

    Ok(availabilities)
}

/// Lists availabilities of a dentist with no appointment at the same slot.
pub async fn list_free_availabilities(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<Availability>> {
    let availabilities = sqlx::query_as::<Postgres, Availability>(
        r#"
        SELECT av.id, av.dentist_id, av.date, av.time, av.created_at
        FROM availabilities av
        WHERE av.dentist_id = $1
          AND NOT EXISTS (
              SELECT 1 FROM appointments ap
              WHERE ap.dentist_id = av.dentist_id
                AND ap.date = av.date
                AND ap.time = av.time
          )
        ORDER BY av.date ASC, av.time ASC
        "#,
    )
    .bind(dentist_id)
    .fetch_all(conn)
    .await?;

    Ok(availabilities)
}
