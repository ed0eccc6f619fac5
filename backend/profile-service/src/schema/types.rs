//! API-facing read model

use async_graphql::{ComplexObject, SimpleObject, Union, ID};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    BusinessProfile, DocumentType, Gender, IndividualProfile, Profile, ProfileDocument,
    ProfileType, ProfileVerification, VerificationStatus,
};

#[derive(SimpleObject, Clone, Debug)]
pub struct ProfileDocumentType {
    pub id: ID,
    pub profile_id: ID,
    pub file_type: DocumentType,
    pub file_name: Option<String>,
    pub url: String,
    pub verified: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<ProfileDocument> for ProfileDocumentType {
    fn from(doc: ProfileDocument) -> Self {
        Self {
            id: ID(doc.id.to_string()),
            profile_id: ID(doc.profile_id.to_string()),
            file_type: doc.file_type,
            file_name: doc.file_name,
            url: doc.url,
            verified: doc.verified,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct ProfileVerificationType {
    pub id: ID,
    pub profile_id: ID,
    pub status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileVerification> for ProfileVerificationType {
    fn from(record: ProfileVerification) -> Self {
        Self {
            id: ID(record.id.to_string()),
            profile_id: ID(record.profile_id.to_string()),
            status: record.status,
            reviewed_by: record.reviewed_by,
            reviewed_at: record.reviewed_at,
            notes: record.notes,
            created_at: record.created_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct IndividualProfileType {
    pub id: ID,
    pub external_user_id: ID,
    pub profile_type: ProfileType,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub documents: Vec<ProfileDocumentType>,
    pub verifications: Vec<ProfileVerificationType>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub national_id_number: Option<String>,
}

#[ComplexObject]
impl IndividualProfileType {
    /// First and last name joined, or whichever one is present
    async fn full_name(&self) -> Option<String> {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
        (None, None) => None,
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct BusinessProfileType {
    pub id: ID,
    pub external_user_id: ID,
    pub profile_type: ProfileType,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub documents: Vec<ProfileDocumentType>,
    pub verifications: Vec<ProfileVerificationType>,
    pub business_name: String,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub legal_representative_name: Option<String>,
}

/// A profile with its kind-specific fields
#[derive(Union, Clone, Debug)]
pub enum ProfileUnion {
    Individual(IndividualProfileType),
    Business(BusinessProfileType),
}

impl ProfileUnion {
    pub fn individual(
        profile: Profile,
        ind: IndividualProfile,
        documents: Vec<ProfileDocumentType>,
        verifications: Vec<ProfileVerificationType>,
    ) -> Self {
        ProfileUnion::Individual(IndividualProfileType {
            id: ID(profile.id.to_string()),
            external_user_id: ID(profile.external_user_id.to_string()),
            profile_type: profile.profile_type,
            phone_number: profile.phone_number,
            country: profile.country,
            city: profile.city,
            address: profile.address,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            documents,
            verifications,
            first_name: ind.first_name,
            last_name: ind.last_name,
            date_of_birth: ind.date_of_birth,
            gender: ind.gender,
            national_id_number: ind.national_id_number,
        })
    }

    pub fn business(
        profile: Profile,
        bus: BusinessProfile,
        documents: Vec<ProfileDocumentType>,
        verifications: Vec<ProfileVerificationType>,
    ) -> Self {
        ProfileUnion::Business(BusinessProfileType {
            id: ID(profile.id.to_string()),
            external_user_id: ID(profile.external_user_id.to_string()),
            profile_type: profile.profile_type,
            phone_number: profile.phone_number,
            country: profile.country,
            city: profile.city,
            address: profile.address,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            documents,
            verifications,
            business_name: bus.business_name,
            registration_number: bus.registration_number,
            tax_id: bus.tax_id,
            legal_representative_name: bus.legal_representative_name,
        })
    }

    pub fn id(&self) -> &ID {
        match self {
            ProfileUnion::Individual(p) => &p.id,
            ProfileUnion::Business(p) => &p.id,
        }
    }

    pub fn profile_type(&self) -> ProfileType {
        match self {
            ProfileUnion::Individual(p) => p.profile_type,
            ProfileUnion::Business(p) => p.profile_type,
        }
    }

    pub fn verifications(&self) -> &[ProfileVerificationType] {
        match self {
            ProfileUnion::Individual(p) => &p.verifications,
            ProfileUnion::Business(p) => &p.verifications,
        }
    }

    pub fn documents(&self) -> &[ProfileDocumentType] {
        match self {
            ProfileUnion::Individual(p) => &p.documents,
            ProfileUnion::Business(p) => &p.documents,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct ProfileListResponse {
    pub profiles: Vec<ProfileUnion>,
    pub total_count: i64,
    pub has_next_page: bool,
}

// ============================================================================
// Mutation envelopes
// ============================================================================

#[derive(SimpleObject, Clone, Debug)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub profile: Option<ProfileUnion>,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct DocumentResponse {
    pub success: bool,
    pub message: String,
    pub document: Option<ProfileDocumentType>,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: String,
    pub verification: Option<ProfileVerificationType>,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}
