use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dentist-declared open slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Availability {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// A confirmed booking occupying a (dentist, date, time) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// Appointment joined with the display name of the other party
/// (the patient for a dentist's listing, the dentist for a patient's).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub counterpart_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAvailability {
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// `{date, time}` body of the calendar endpoints. Fields stay optional so a
/// missing value is reported as a validation error rather than a JSON
/// rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotRequest {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// `{id}` body of the remove/cancel endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdRequest {
    pub id: Option<Uuid>,
}

/// Dentist's direct scheduling of a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub patient_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Event shape consumed by the calendar widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DDTHH:MM:00`
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "extendedProps", skip_serializing_if = "Option::is_none")]
    pub extended_props: Option<serde_json::Value>,
}

/// Formats a slot as the calendar's local start timestamp.
pub fn event_start(date: NaiveDate, time: NaiveTime) -> String {
    format!("{}T{}:00", date.format("%Y-%m-%d"), time.format("%H:%M"))
}

/// Serializes slot times as `HH:MM`; accepts `HH:MM` or `HH:MM:SS` and drops
/// the seconds.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map(crate::validation::slot_minute)
            .map_err(serde::de::Error::custom)
    }
}
