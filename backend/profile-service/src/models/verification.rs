use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::VerificationStatus;

/// One record of the KYC review history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileVerification {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new history record. `reviewed_at` is stamped by storage when a
/// reviewer is present.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewVerification {
    pub profile_id: Uuid,
    pub status: VerificationStatus,
    #[validate(length(max = 255))]
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

impl NewVerification {
    pub fn pending(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            status: VerificationStatus::Pending,
            reviewed_by: None,
            notes: None,
        }
    }
}

/// Review outcome applied to an existing record.
///
/// `reviewed_by` and `notes` are only replaced when present; `reviewed_at`
/// is always stamped.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct VerificationReview {
    pub status: VerificationStatus,
    #[validate(length(max = 255))]
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

impl VerificationReview {
    pub fn apply(&self, record: &mut ProfileVerification, now: DateTime<Utc>) {
        record.status = self.status;
        if let Some(reviewer) = &self.reviewed_by {
            record.reviewed_by = Some(reviewer.clone());
        }
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
        record.reviewed_at = Some(now);
    }
}
