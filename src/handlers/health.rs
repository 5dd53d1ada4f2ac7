use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GET /api/v1/health
///
/// Liveness probe. Public, and answers without touching the database:
/// `{"status":"ok"}`.
pub async fn health_check() -> Json<Health> {
    Json(Health { status: "ok" })
}
