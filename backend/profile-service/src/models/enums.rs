//! Fixed vocabularies shared by storage and the GraphQL surface

use serde::{Deserialize, Serialize};

/// Kind of profile. Fixed at creation.
#[derive(
    async_graphql::Enum,
    sqlx::Type,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[sqlx(type_name = "profile_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    Individual,
    Business,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Individual => "INDIVIDUAL",
            ProfileType::Business => "BUSINESS",
        }
    }
}

#[derive(
    async_graphql::Enum,
    sqlx::Type,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[sqlx(type_name = "gender", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// Type of an uploaded supporting document
#[derive(
    async_graphql::Enum,
    sqlx::Type,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    IdCard,
    Passport,
    CompanyRegistration,
    TaxCertificate,
    ProfilePhoto,
    ProofOfAddress,
    Other,
}

/// Outcome of one KYC review
#[derive(
    async_graphql::Enum,
    sqlx::Type,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_storage_labels() {
        assert_eq!(
            serde_json::to_string(&Gender::PreferNotToSay).unwrap(),
            "\"PREFER_NOT_TO_SAY\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentType::ProofOfAddress).unwrap(),
            "\"PROOF_OF_ADDRESS\""
        );
        assert_eq!(ProfileType::Business.as_str(), "BUSINESS");
        assert_eq!(VerificationStatus::default(), VerificationStatus::Pending);
    }
}
