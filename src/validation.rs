//! Input validation utilities for the service layer.
//!
//! Request bodies arrive with optional fields; these helpers turn them into
//! typed values or a field-level validation error.

use chrono::{NaiveDate, NaiveTime, Timelike};
use uuid::Uuid;

use crate::error::{Error, Result, ValidationErrors};

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::Validation(ValidationErrors::single(field, message))
}

/// Validates email format using structural checks
///
/// # Examples
/// ```
/// use odonto::validation::validate_email;
///
/// validate_email("user@example.com").unwrap();
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(invalid("email", "Email cannot be empty"));
    }

    if email.len() > 254 {
        return Err(invalid("email", "Email address is too long (max 254 characters)"));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(invalid("email", "Invalid email format: must contain exactly one @ symbol"));
    }

    let (local_part, domain) = (parts[0], parts[1]);

    if local_part.is_empty() || local_part.len() > 64 {
        return Err(invalid("email", "Invalid email format: bad local part"));
    }

    if domain.is_empty() || domain.len() > 253 || !domain.contains('.') {
        return Err(invalid("email", "Invalid email format: domain must contain at least one dot"));
    }

    if email.contains("..") {
        return Err(invalid("email", "Invalid email format: cannot contain consecutive dots"));
    }

    let invalid_chars = ['<', '>', '(', ')', '[', ']', '\\', ',', ';', ':', '"', ' '];
    if let Some(c) = invalid_chars.iter().find(|c| email.contains(**c)) {
        return Err(invalid("email", format!("Invalid email format: cannot contain '{}'", c)));
    }

    Ok(())
}

/// Lower-cases and trims an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates password length and format
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(invalid("password", "Password must be at least 6 characters long"));
    }

    if password.len() > 128 {
        return Err(invalid("password", "Password is too long (max 128 characters)"));
    }

    if password.contains(' ') {
        return Err(invalid("password", "Password cannot contain spaces"));
    }

    Ok(())
}

/// Validates a person's display name and returns it trimmed
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(invalid("name", "Name cannot be empty"));
    }

    if name.chars().count() > 100 {
        return Err(invalid("name", "Name must be less than 100 characters"));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(invalid("name", "Name cannot contain control characters"));
    }

    Ok(name.to_string())
}

/// Returns the trimmed value, or `ValidationMissing(field)` when absent or blank.
pub fn require_field<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::ValidationMissing(field.to_string())),
    }
}

/// Returns the id, or `ValidationMissing(field)` when absent.
pub fn require_id(value: Option<Uuid>, field: &str) -> Result<Uuid> {
    value.ok_or_else(|| Error::ValidationMissing(field.to_string()))
}

/// Parses a calendar slot from `YYYY-MM-DD` and `HH:MM`. Seconds are
/// accepted but dropped, so `09:00:30` names the `09:00` slot.
///
/// Missing values yield `ValidationMissing`; malformed ones a field error.
pub fn parse_slot(date: Option<&str>, time: Option<&str>) -> Result<(NaiveDate, NaiveTime)> {
    let date = require_field(date, "date")?;
    let time = require_field(time, "time")?;

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| invalid("date", "Expected YYYY-MM-DD"))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| invalid("time", "Expected HH:MM"))?;

    Ok((date, slot_minute(time)))
}

/// Truncates a time to whole minutes. Slots are identified at minute
/// precision.
pub fn slot_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Trims an optional string and drops it when blank.
pub fn optional_trimmed(input: Option<String>) -> Option<String> {
    input
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
