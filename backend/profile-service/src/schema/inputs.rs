//! GraphQL input objects and their conversion into service arguments

use async_graphql::{InputObject, MaybeUndefined, Result as GraphQLResult, ID};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::{PageRequest, ProfileFilter};
use crate::models::{
    BusinessChanges, ContactChanges, ContactInfo, DocumentType, Gender, IndividualChanges,
    NewBusiness, NewDocument, NewIndividual, NewVerification, Patch, ProfileType,
    VerificationReview, VerificationStatus,
};

/// Malformed ids fail here, before reaching the service.
pub fn parse_id(id: &ID, field: &str) -> GraphQLResult<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| format!("Invalid {}: not a valid UUID", field).into())
}

fn patch<T>(value: MaybeUndefined<T>) -> Patch<T> {
    match value {
        MaybeUndefined::Undefined => Patch::Unchanged,
        MaybeUndefined::Null => Patch::Clear,
        MaybeUndefined::Value(v) => Patch::Set(v),
    }
}

#[derive(InputObject, Debug)]
pub struct CreateIndividualProfileInput {
    pub external_user_id: ID,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub national_id_number: Option<String>,
}

impl CreateIndividualProfileInput {
    pub fn into_parts(self) -> GraphQLResult<(Uuid, ContactInfo, NewIndividual)> {
        let external_user_id = parse_id(&self.external_user_id, "externalUserId")?;
        Ok((
            external_user_id,
            ContactInfo {
                phone_number: self.phone_number,
                country: self.country,
                city: self.city,
                address: self.address,
            },
            NewIndividual {
                first_name: self.first_name,
                last_name: self.last_name,
                date_of_birth: self.date_of_birth,
                gender: self.gender,
                national_id_number: self.national_id_number,
            },
        ))
    }
}

#[derive(InputObject, Debug)]
pub struct CreateBusinessProfileInput {
    pub external_user_id: ID,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Required; an absent or blank value is rejected by the service
    pub business_name: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub legal_representative_name: Option<String>,
}

impl CreateBusinessProfileInput {
    pub fn into_parts(self) -> GraphQLResult<(Uuid, ContactInfo, NewBusiness)> {
        let external_user_id = parse_id(&self.external_user_id, "externalUserId")?;
        Ok((
            external_user_id,
            ContactInfo {
                phone_number: self.phone_number,
                country: self.country,
                city: self.city,
                address: self.address,
            },
            NewBusiness {
                business_name: self.business_name.unwrap_or_default(),
                registration_number: self.registration_number,
                tax_id: self.tax_id,
                legal_representative_name: self.legal_representative_name,
            },
        ))
    }
}

/// Omitted fields are left alone; `null` clears the stored value.
#[derive(InputObject, Debug, Default)]
pub struct UpdateIndividualProfileInput {
    pub phone_number: MaybeUndefined<String>,
    pub country: MaybeUndefined<String>,
    pub city: MaybeUndefined<String>,
    pub address: MaybeUndefined<String>,
    pub first_name: MaybeUndefined<String>,
    pub last_name: MaybeUndefined<String>,
    pub date_of_birth: MaybeUndefined<NaiveDate>,
    pub gender: MaybeUndefined<Gender>,
    pub national_id_number: MaybeUndefined<String>,
}

impl UpdateIndividualProfileInput {
    pub fn into_changes(self) -> (ContactChanges, IndividualChanges) {
        (
            ContactChanges {
                phone_number: patch(self.phone_number),
                country: patch(self.country),
                city: patch(self.city),
                address: patch(self.address),
            },
            IndividualChanges {
                first_name: patch(self.first_name),
                last_name: patch(self.last_name),
                date_of_birth: patch(self.date_of_birth),
                gender: patch(self.gender),
                national_id_number: patch(self.national_id_number),
            },
        )
    }
}

/// Omitted fields are left alone; `null` clears the stored value.
/// `businessName` cannot be cleared.
#[derive(InputObject, Debug, Default)]
pub struct UpdateBusinessProfileInput {
    pub phone_number: MaybeUndefined<String>,
    pub country: MaybeUndefined<String>,
    pub city: MaybeUndefined<String>,
    pub address: MaybeUndefined<String>,
    pub business_name: MaybeUndefined<String>,
    pub registration_number: MaybeUndefined<String>,
    pub tax_id: MaybeUndefined<String>,
    pub legal_representative_name: MaybeUndefined<String>,
}

impl UpdateBusinessProfileInput {
    pub fn into_changes(self) -> (ContactChanges, BusinessChanges) {
        (
            ContactChanges {
                phone_number: patch(self.phone_number),
                country: patch(self.country),
                city: patch(self.city),
                address: patch(self.address),
            },
            BusinessChanges {
                business_name: patch(self.business_name),
                registration_number: patch(self.registration_number),
                tax_id: patch(self.tax_id),
                legal_representative_name: patch(self.legal_representative_name),
            },
        )
    }
}

#[derive(InputObject, Debug)]
pub struct UploadDocumentInput {
    pub profile_id: ID,
    pub file_type: DocumentType,
    pub file_name: Option<String>,
    pub url: String,
}

impl UploadDocumentInput {
    pub fn into_new(self) -> GraphQLResult<NewDocument> {
        Ok(NewDocument {
            profile_id: parse_id(&self.profile_id, "profileId")?,
            file_type: self.file_type,
            file_name: self.file_name,
            url: self.url,
        })
    }
}

#[derive(InputObject, Debug)]
pub struct VerifyDocumentInput {
    pub document_id: ID,
    pub verified: bool,
}

#[derive(InputObject, Debug)]
pub struct VerifyProfileInput {
    pub profile_id: ID,
    #[graphql(default_with = "VerificationStatus::Pending")]
    pub status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

impl VerifyProfileInput {
    pub fn into_new(self) -> GraphQLResult<NewVerification> {
        Ok(NewVerification {
            profile_id: parse_id(&self.profile_id, "profileId")?,
            status: self.status,
            reviewed_by: self.reviewed_by,
            notes: self.notes,
        })
    }
}

#[derive(InputObject, Debug)]
pub struct UpdateVerificationInput {
    pub verification_id: ID,
    pub status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

impl UpdateVerificationInput {
    pub fn into_review(self) -> GraphQLResult<(Uuid, VerificationReview)> {
        let id = parse_id(&self.verification_id, "verificationId")?;
        Ok((
            id,
            VerificationReview {
                status: self.status,
                reviewed_by: self.reviewed_by,
                notes: self.notes,
            },
        ))
    }
}

#[derive(InputObject, Debug, Default)]
pub struct ProfileFilterInput {
    pub profile_type: Option<ProfileType>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Matches profiles with any record in this status
    pub verification_status: Option<VerificationStatus>,
    /// Phone number or address substring
    pub search: Option<String>,
}

impl From<ProfileFilterInput> for ProfileFilter {
    fn from(input: ProfileFilterInput) -> Self {
        Self {
            profile_type: input.profile_type,
            country: input.country,
            city: input.city,
            verification_status: input.verification_status,
            search: input.search,
        }
    }
}

#[derive(InputObject, Debug)]
pub struct PaginationInput {
    #[graphql(default = 20)]
    pub limit: i32,
    #[graphql(default = 0)]
    pub offset: i32,
}

impl From<PaginationInput> for PageRequest {
    fn from(input: PaginationInput) -> Self {
        Self {
            limit: i64::from(input.limit),
            offset: i64::from(input.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&ID(id.to_string()), "id").unwrap(), id);
        assert!(parse_id(&ID("not-a-uuid".to_string()), "id").is_err());
    }

    #[test]
    fn test_maybe_undefined_to_patch() {
        assert_eq!(patch::<String>(MaybeUndefined::Undefined), Patch::Unchanged);
        assert_eq!(patch::<String>(MaybeUndefined::Null), Patch::Clear);
        assert_eq!(
            patch(MaybeUndefined::Value("x".to_string())),
            Patch::Set("x".to_string())
        );
    }

    #[test]
    fn test_update_input_defaults_to_unchanged() {
        let (contact, changes) = UpdateBusinessProfileInput {
            city: MaybeUndefined::Value("Oslo".to_string()),
            tax_id: MaybeUndefined::Null,
            ..Default::default()
        }
        .into_changes();

        assert_eq!(contact.city, Patch::Set("Oslo".to_string()));
        assert!(contact.country.is_unchanged());
        assert!(changes.tax_id.is_clear());
        assert!(changes.business_name.is_unchanged());
    }
}
