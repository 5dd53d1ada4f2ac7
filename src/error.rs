use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field-level validation failures, rendered under `fields` in error bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationErrors {
    Single { field: String, message: String },
    Multiple { fields: HashMap<String, String> },
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        ValidationErrors::Single {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationErrors::Single { field, message } => write!(f, "{}: {}", field, message),
            ValidationErrors::Multiple { fields } => {
                let mut pairs: Vec<_> = fields.iter().collect();
                pairs.sort();
                let joined = pairs
                    .into_iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}", joined)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A migration error raised at startup.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The dentist already declared this (date, time) as available.
    #[error("Availability already exists for this slot")]
    DuplicateSlot,

    /// Another appointment already occupies this (dentist, date, time).
    #[error("Slot already occupied")]
    SlotOccupied,

    /// The row does not exist or does not belong to the requester.
    #[error("Not found or not owned by requester: {0}")]
    NotFoundOrForbidden(String),

    /// A required request field (date, time, id) was absent or empty.
    #[error("Missing field: {0}")]
    ValidationMissing(String),

    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller's role may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Email already registered.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials, or a missing, invalid or expired access token.
    #[error("Unauthenticated: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// A filesystem error while storing uploads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::DuplicateSlot => StatusCode::CONFLICT,
            Error::SlotOccupied => StatusCode::CONFLICT,
            Error::NotFoundOrForbidden(_) => StatusCode::NOT_FOUND,
            Error::ValidationMissing(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Migrate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every error body carries `"ok": false` next to a short message and a
/// machine-readable code, so calendar clients can branch on `ok` alone.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Error::DuplicateSlot => {
                serde_json::json!({
                    "ok": false,
                    "msg": "duplicado",
                    "code": "DUPLICATE_SLOT"
                })
            }
            Error::SlotOccupied => {
                serde_json::json!({
                    "ok": false,
                    "msg": "ocupado",
                    "code": "SLOT_OCCUPIED"
                })
            }
            Error::NotFoundOrForbidden(msg) | Error::NotFound(msg) => {
                serde_json::json!({
                    "ok": false,
                    "msg": msg,
                    "code": "NOT_FOUND"
                })
            }
            Error::ValidationMissing(field) => {
                serde_json::json!({
                    "ok": false,
                    "msg": format!("{} missing", field),
                    "code": "VALIDATION_ERROR",
                    "fields": {
                        field: "required"
                    }
                })
            }
            Error::Validation(errors) => {
                let fields = match errors {
                    ValidationErrors::Single { field, message } => {
                        serde_json::json!({ field: message })
                    }
                    ValidationErrors::Multiple { fields } => serde_json::json!(fields),
                };
                serde_json::json!({
                    "ok": false,
                    "msg": "Validation failed",
                    "code": "VALIDATION_ERROR",
                    "fields": fields
                })
            }
            Error::Forbidden(msg) => {
                serde_json::json!({
                    "ok": false,
                    "msg": msg,
                    "code": "FORBIDDEN"
                })
            }
            Error::Conflict(msg) => {
                serde_json::json!({
                    "ok": false,
                    "msg": msg,
                    "code": "CONFLICT"
                })
            }
            Error::Authentication(msg) => {
                serde_json::json!({
                    "ok": false,
                    "msg": msg,
                    "code": "AUTHENTICATION_FAILED"
                })
            }
            Error::Config(_) => {
                serde_json::json!({
                    "ok": false,
                    "msg": "Configuration error",
                    "code": "CONFIG_ERROR"
                })
            }
            Error::Sqlx(_) | Error::Migrate(_) | Error::Internal(_) | Error::Io(_) => {
                tracing::error!(error = %self, "request failed with internal error");
                serde_json::json!({
                    "ok": false,
                    "msg": "Internal error",
                    "code": "INTERNAL_ERROR"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
