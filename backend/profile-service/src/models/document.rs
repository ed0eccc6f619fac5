use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::DocumentType;

/// Metadata for a supporting file; the file itself lives elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileDocument {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub file_type: DocumentType,
    pub file_name: Option<String>,
    pub url: String,
    pub verified: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewDocument {
    pub profile_id: Uuid,
    pub file_type: DocumentType,
    #[validate(length(max = 255))]
    pub file_name: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub url: String,
}
