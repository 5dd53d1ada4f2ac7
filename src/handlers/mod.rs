pub mod admin;
pub mod auth;
pub mod calendar;
pub mod dentist;
pub mod health;
pub mod patient;

pub use admin::*;
pub use auth::*;
pub use calendar::*;
pub use dentist::*;
pub use health::*;
pub use patient::*;

use axum::extract::multipart::{Field, MultipartError};
use sqlx::{Postgres, pool::PoolConnection};

use crate::{
    error::{Error, Result, ValidationErrors},
    state::AppState,
};

/// Acquires one pooled connection for the duration of a request.
pub(crate) async fn acquire_conn(state: &AppState) -> Result<PoolConnection<Postgres>> {
    state
        .pool
        .acquire()
        .await
        .map_err(|e| Error::Internal(format!("Failed to acquire database connection: {}", e)))
}

/// A file part of a multipart form.
#[derive(Debug, Default)]
pub(crate) struct UploadedFile {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub(crate) async fn read(field: Field<'_>) -> Result<Self> {
        let file_name = field.file_name().map(str::to_string);
        let content = field.bytes().await.map_err(form_error)?.to_vec();
        Ok(Self { file_name, content })
    }
}

pub(crate) fn form_error(e: MultipartError) -> Error {
    tracing::debug!(error = %e, "malformed multipart body");
    Error::Validation(ValidationErrors::single("form", e.body_text()))
}
