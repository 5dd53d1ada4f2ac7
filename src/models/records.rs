use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::models::users::PublicUser;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    /// Intake note or scanned intake form.
    Anamnesis,
    /// Scanned clinical chart (ficha clínica).
    ClinicalSheet,
}

impl RecordKind {
    /// Subdirectory of the upload root holding images of this kind.
    pub fn upload_dir(self) -> &'static str {
        match self {
            RecordKind::Anamnesis => "anamneses",
            RecordKind::ClinicalSheet => "fichas",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub kind: RecordKind,
    pub content: Option<String>,
    pub assessment: Option<String>,
    pub image_path: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClinicalRecord {
    pub patient_id: Uuid,
    pub kind: RecordKind,
    pub content: Option<String>,
    pub assessment: Option<String>,
    pub image_path: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnamnesisNote {
    pub content: Option<String>,
    pub assessment: Option<String>,
}

/// Patient profile with the full record history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientChart {
    pub patient: PublicUser,
    pub records: Vec<ClinicalRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsQuery {
    pub kind: Option<RecordKind>,
}
