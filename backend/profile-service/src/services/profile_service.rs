//! Profile service
//!
//! Enforces the rules storage does not (one profile per external user,
//! business name presence, input limits) and assembles the polymorphic
//! read model.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{EntityStore, PageRequest, ProfileFilter, ProfileStore};
use crate::error::{Result, ServiceError, StoreError};
use crate::models::{
    BusinessChanges, ContactChanges, ContactInfo, IndividualChanges, NewBusiness, NewDocument,
    NewIndividual, NewProfile, NewSpecialization, NewVerification, Patch, ProfileChanges,
    Profile, ProfileDetails, ProfileDocument, ProfileType, ProfileVerification, Specialization,
    VerificationReview,
};
use crate::schema::types::{
    ProfileDocumentType, ProfileListResponse, ProfileUnion, ProfileVerificationType,
};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileUnion>> {
        self.store
            .get_profile_with_details(id)
            .await?
            .map(to_profile_union)
            .transpose()
    }

    pub async fn get_profile_by_user(&self, external_user_id: Uuid) -> Result<Option<ProfileUnion>> {
        self.store
            .get_profile_by_external_id(external_user_id)
            .await?
            .map(to_profile_union)
            .transpose()
    }

    pub async fn list_profiles(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> Result<ProfileListResponse> {
        let page = normalize_page(page)?;

        let (rows, total_count) = self.store.search_profiles(filter, page).await?;
        let profiles = rows
            .into_iter()
            .map(to_profile_union)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProfileListResponse {
            profiles,
            total_count,
            has_next_page: page.offset + page.limit < total_count,
        })
    }

    pub async fn get_profile_documents(&self, profile_id: Uuid) -> Result<Vec<ProfileDocumentType>> {
        let documents = self.store.list_documents(profile_id).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    pub async fn get_profile_verifications(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ProfileVerificationType>> {
        let records = self.store.list_verifications(profile_id).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn get_latest_verification(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProfileVerificationType>> {
        let latest = self.store.get_latest_verification(profile_id).await?;
        Ok(latest.map(Into::into))
    }

    // ========================================================================
    // Profile writes
    // ========================================================================

    pub async fn create_individual_profile(
        &self,
        external_user_id: Uuid,
        contact: ContactInfo,
        individual: NewIndividual,
    ) -> Result<ProfileUnion> {
        self.ensure_no_profile_for(external_user_id).await?;
        contact.validate()?;
        individual.validate()?;

        self.create(NewProfile {
            external_user_id,
            contact,
            specialization: NewSpecialization::Individual(individual),
        })
        .await
    }

    pub async fn create_business_profile(
        &self,
        external_user_id: Uuid,
        contact: ContactInfo,
        business: NewBusiness,
    ) -> Result<ProfileUnion> {
        self.ensure_no_profile_for(external_user_id).await?;
        if business.business_name.trim().is_empty() {
            warn!(external_user_id = %external_user_id, "Business profile without business name rejected");
            return Err(ServiceError::BusinessNameRequired);
        }
        contact.validate()?;
        business.validate()?;

        self.create(NewProfile {
            external_user_id,
            contact,
            specialization: NewSpecialization::Business(business),
        })
        .await
    }

    /// Uniqueness per external user is checked before any other rule.
    async fn ensure_no_profile_for(&self, external_user_id: Uuid) -> Result<()> {
        if self
            .store
            .get_profile_by_external_id(external_user_id)
            .await?
            .is_some()
        {
            warn!(external_user_id = %external_user_id, "Profile already exists for user");
            return Err(ServiceError::ProfileAlreadyExists);
        }
        Ok(())
    }

    async fn create(&self, new: NewProfile) -> Result<ProfileUnion> {
        let external_user_id = new.external_user_id;
        let profile_type = new.kind();
        let details = match self.store.create_profile_with_specialization(new).await {
            Ok(details) => details,
            // Lost a race against a concurrent create for the same user
            Err(StoreError::Conflict { constraint })
                if constraint == "profiles_external_user_id_key" =>
            {
                warn!(external_user_id = %external_user_id, "Profile already exists for user");
                return Err(ServiceError::ProfileAlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            profile_id = %details.id(),
            external_user_id = %external_user_id,
            profile_type = profile_type.as_str(),
            "Profile created"
        );
        to_profile_union(details)
    }

    pub async fn update_individual_profile(
        &self,
        id: Uuid,
        contact: ContactChanges,
        changes: IndividualChanges,
    ) -> Result<Option<ProfileUnion>> {
        contact.provided().validate()?;
        changes.provided().validate()?;

        self.update(id, ProfileChanges::individual(contact, changes))
            .await
    }

    pub async fn update_business_profile(
        &self,
        id: Uuid,
        contact: ContactChanges,
        changes: BusinessChanges,
    ) -> Result<Option<ProfileUnion>> {
        match &changes.business_name {
            Patch::Clear => {
                return Err(ServiceError::InvalidInput(
                    "business name cannot be cleared".to_string(),
                ))
            }
            Patch::Set(name) if name.trim().is_empty() => {
                return Err(ServiceError::BusinessNameRequired);
            }
            _ => {}
        }
        contact.provided().validate()?;
        changes.provided().validate()?;

        self.update(id, ProfileChanges::business(contact, changes))
            .await
    }

    async fn update(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<ProfileUnion>> {
        let kind = changes.kind();
        match self.store.update_specialized_profile(id, &changes).await? {
            Some(details) => {
                info!(profile_id = %id, profile_type = kind.as_str(), "Profile updated");
                to_profile_union(details).map(Some)
            }
            None => {
                warn!(profile_id = %id, profile_type = kind.as_str(), "Profile to update not found or of another type");
                Ok(None)
            }
        }
    }

    pub async fn delete_profile(&self, id: Uuid) -> Result<bool> {
        let deleted = EntityStore::<Profile>::delete(self.store.as_ref(), id).await?;
        if deleted {
            info!(profile_id = %id, "Profile deleted");
        }
        Ok(deleted)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub async fn upload_document(&self, new: NewDocument) -> Result<ProfileDocumentType> {
        new.validate()?;
        self.ensure_profile_exists(new.profile_id).await?;

        let document = self.store.create_document(new).await?;
        info!(
            document_id = %document.id,
            profile_id = %document.profile_id,
            "Profile document uploaded"
        );
        Ok(document.into())
    }

    pub async fn verify_document(
        &self,
        id: Uuid,
        verified: bool,
    ) -> Result<Option<ProfileDocumentType>> {
        let document = self.store.set_document_verified(id, verified).await?;
        if document.is_some() {
            info!(document_id = %id, verified, "Document verification flag set");
        }
        Ok(document.map(Into::into))
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let deleted = EntityStore::<ProfileDocument>::delete(self.store.as_ref(), id).await?;
        if deleted {
            info!(document_id = %id, "Profile document deleted");
        }
        Ok(deleted)
    }

    // ========================================================================
    // Verifications
    // ========================================================================

    /// Append a history record. A reviewer given here is stamped in the same insert.
    pub async fn verify_profile(&self, new: NewVerification) -> Result<ProfileVerificationType> {
        new.validate()?;
        self.ensure_profile_exists(new.profile_id).await?;

        let record = self.store.create_verification(new).await?;
        info!(
            verification_id = %record.id,
            profile_id = %record.profile_id,
            status = record.status.as_str(),
            "Verification record created"
        );
        Ok(record.into())
    }

    pub async fn update_verification(
        &self,
        id: Uuid,
        review: VerificationReview,
    ) -> Result<Option<ProfileVerificationType>> {
        review.validate()?;

        let record = self.store.update_verification(id, &review).await?;
        match &record {
            Some(r) => info!(
                verification_id = %id,
                profile_id = %r.profile_id,
                status = r.status.as_str(),
                "Verification record updated"
            ),
            None => warn!(verification_id = %id, "Verification record not found"),
        }
        Ok(record.map(Into::into))
    }

    pub async fn get_verification(&self, id: Uuid) -> Result<Option<ProfileVerification>> {
        Ok(EntityStore::<ProfileVerification>::get_by_id(self.store.as_ref(), id).await?)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<ProfileDocument>> {
        Ok(EntityStore::<ProfileDocument>::get_by_id(self.store.as_ref(), id).await?)
    }

    async fn ensure_profile_exists(&self, profile_id: Uuid) -> Result<()> {
        let exists = EntityStore::<Profile>::get_by_id(self.store.as_ref(), profile_id)
            .await?
            .is_some();
        if !exists {
            warn!(profile_id = %profile_id, "Referenced profile not found");
            return Err(ServiceError::ProfileNotFound);
        }
        Ok(())
    }
}

/// Negative values are rejected; oversized limits are clamped to `MAX_PAGE_SIZE`.
fn normalize_page(page: PageRequest) -> Result<PageRequest> {
    if page.limit < 0 {
        return Err(ServiceError::InvalidInput(
            "limit must not be negative".to_string(),
        ));
    }
    if page.offset < 0 {
        return Err(ServiceError::InvalidInput(
            "offset must not be negative".to_string(),
        ));
    }
    Ok(PageRequest {
        limit: page.limit.min(MAX_PAGE_SIZE),
        offset: page.offset,
    })
}

/// Build the read model. The loaded specialization must match the declared kind.
pub fn to_profile_union(details: ProfileDetails) -> Result<ProfileUnion> {
    let ProfileDetails {
        profile,
        specialization,
        documents,
        verifications,
    } = details;

    let documents = documents.into_iter().map(Into::into).collect();
    let verifications = verifications.into_iter().map(Into::into).collect();

    match (profile.profile_type, specialization) {
        (ProfileType::Individual, Some(Specialization::Individual(ind))) => Ok(
            ProfileUnion::individual(profile, ind, documents, verifications),
        ),
        (ProfileType::Business, Some(Specialization::Business(bus))) => Ok(
            ProfileUnion::business(profile, bus, documents, verifications),
        ),
        (kind, _) => {
            error!(
                profile_id = %profile.id,
                profile_type = kind.as_str(),
                "Profile has no matching specialization"
            );
            Err(ServiceError::MissingSpecialization {
                profile_id: profile.id,
                profile_type: kind.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessProfile, IndividualProfile};
    use chrono::Utc;

    fn base(kind: ProfileType) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            external_user_id: Uuid::new_v4(),
            profile_type: kind,
            phone_number: None,
            country: None,
            city: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_union_matches_kind() {
        let profile = base(ProfileType::Business);
        let id = profile.id;
        let details = ProfileDetails {
            profile,
            specialization: Some(Specialization::Business(BusinessProfile {
                id,
                business_name: "Acme".to_string(),
                registration_number: None,
                tax_id: None,
                legal_representative_name: None,
            })),
            documents: vec![],
            verifications: vec![],
        };

        match to_profile_union(details).unwrap() {
            ProfileUnion::Business(b) => assert_eq!(b.business_name, "Acme"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_union_rejects_mismatched_specialization() {
        let profile = base(ProfileType::Business);
        let id = profile.id;
        let details = ProfileDetails {
            profile,
            specialization: Some(Specialization::Individual(IndividualProfile {
                id,
                first_name: None,
                last_name: None,
                date_of_birth: None,
                gender: None,
                national_id_number: None,
            })),
            documents: vec![],
            verifications: vec![],
        };

        let err = to_profile_union(details).unwrap_err();
        assert!(matches!(err, ServiceError::MissingSpecialization { .. }));
        assert!(!err.is_domain());
    }

    #[test]
    fn test_union_rejects_missing_specialization() {
        let details = ProfileDetails {
            profile: base(ProfileType::Individual),
            specialization: None,
            documents: vec![],
            verifications: vec![],
        };
        assert!(matches!(
            to_profile_union(details),
            Err(ServiceError::MissingSpecialization { .. })
        ));
    }

    #[test]
    fn test_page_bounds() {
        let page = |limit, offset| PageRequest { limit, offset };

        assert_eq!(normalize_page(page(20, 0)).unwrap(), page(20, 0));
        assert_eq!(normalize_page(page(0, 0)).unwrap(), page(0, 0));
        assert_eq!(normalize_page(page(500, 40)).unwrap(), page(MAX_PAGE_SIZE, 40));
        assert!(normalize_page(page(-1, 0)).is_err());
        assert!(normalize_page(page(10, -1)).is_err());
    }
}
