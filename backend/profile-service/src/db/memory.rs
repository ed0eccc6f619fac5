//! In-process store used by tests and local runs.
//!
//! Enforces the same unique constraints and ownership cascade as the SQL
//! schema. All tables sit behind one lock so multi-row writes are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApiKeyStore, EntityStore, PageRequest, ProfileFilter, ProfileStore, StoreResult,
};
use crate::error::StoreError;
use crate::models::{
    ApiKey, NewApiKey, NewDocument, NewProfile, NewVerification, Profile, ProfileChanges,
    ProfileDetails, ProfileDocument, ProfileVerification, Specialization, VerificationReview,
};

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order
    profiles: Vec<Profile>,
    specializations: HashMap<Uuid, Specialization>,
    documents: Vec<ProfileDocument>,
    verifications: Vec<ProfileVerification>,
    api_keys: Vec<ApiKey>,
    last_tick: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps at database precision.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = truncate_micros(Utc::now());
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    fn details(&self, profile: &Profile) -> ProfileDetails {
        ProfileDetails {
            profile: profile.clone(),
            specialization: self.specializations.get(&profile.id).cloned(),
            documents: self.documents_of(profile.id),
            verifications: self.verifications_of(profile.id),
        }
    }

    fn documents_of(&self, profile_id: Uuid) -> Vec<ProfileDocument> {
        self.documents
            .iter()
            .filter(|d| d.profile_id == profile_id)
            .cloned()
            .collect()
    }

    fn verifications_of(&self, profile_id: Uuid) -> Vec<ProfileVerification> {
        let mut records: Vec<ProfileVerification> = self
            .verifications
            .iter()
            .filter(|v| v.profile_id == profile_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Unique constraints of the specialization tables, ignoring `owner`.
    fn check_specialization_unique(
        &self,
        candidate: &Specialization,
        owner: Uuid,
    ) -> StoreResult<()> {
        for (id, existing) in &self.specializations {
            if *id == owner {
                continue;
            }
            match (candidate, existing) {
                (Specialization::Individual(new), Specialization::Individual(old)) => {
                    if same_value(&new.national_id_number, &old.national_id_number) {
                        return Err(StoreError::conflict(
                            "individual_profiles_national_id_number_key",
                        ));
                    }
                }
                (Specialization::Business(new), Specialization::Business(old)) => {
                    if same_value(&new.registration_number, &old.registration_number) {
                        return Err(StoreError::conflict(
                            "business_profiles_registration_number_key",
                        ));
                    }
                    if same_value(&new.tax_id, &old.tax_id) {
                        return Err(StoreError::conflict("business_profiles_tax_id_key"));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn matches(&self, profile: &Profile, filter: &ProfileFilter) -> bool {
        if let Some(kind) = filter.profile_type {
            if profile.profile_type != kind {
                return false;
            }
        }
        if let Some(country) = filter.country() {
            if !contains_ci(profile.country.as_deref(), country) {
                return false;
            }
        }
        if let Some(city) = filter.city() {
            if !contains_ci(profile.city.as_deref(), city) {
                return false;
            }
        }
        if let Some(status) = filter.verification_status {
            let any = self
                .verifications
                .iter()
                .any(|v| v.profile_id == profile.id && v.status == status);
            if !any {
                return false;
            }
        }
        if let Some(term) = filter.search() {
            if !contains_ci(profile.phone_number.as_deref(), term)
                && !contains_ci(profile.address.as_deref(), term)
            {
                return false;
            }
        }
        true
    }

    fn insert_verification(&mut self, new: NewVerification) -> ProfileVerification {
        let now = self.tick();
        let reviewed_at = new.reviewed_by.as_ref().map(|_| now);
        let record = ProfileVerification {
            id: Uuid::new_v4(),
            profile_id: new.profile_id,
            status: new.status,
            reviewed_by: new.reviewed_by,
            reviewed_at,
            notes: new.notes,
            created_at: now,
        };
        self.verifications.push(record.clone());
        record
    }
}

fn truncate_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

fn same_value(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    tables: RwLock<Tables>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile without its specialization. Only useful for
    /// exercising read-model integrity checks.
    pub async fn insert_bare_profile(&self, profile: Profile) {
        let mut tables = self.tables.write().await;
        tables.profiles.push(profile);
    }
}

#[async_trait]
impl EntityStore<Profile> for InMemoryProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables.read().await.profile(id).cloned())
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<Profile>> {
        Ok(paginate(&self.tables.read().await.profiles, page))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.profiles.len() as i64)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Ok(false);
        }
        tables.specializations.remove(&id);
        tables.documents.retain(|d| d.profile_id != id);
        tables.verifications.retain(|v| v.profile_id != id);
        Ok(true)
    }
}

#[async_trait]
impl EntityStore<ProfileDocument> for InMemoryProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<ProfileDocument>> {
        let tables = self.tables.read().await;
        Ok(tables.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<ProfileDocument>> {
        Ok(paginate(&self.tables.read().await.documents, page))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.documents.len() as i64)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.documents.len();
        tables.documents.retain(|d| d.id != id);
        Ok(tables.documents.len() != before)
    }
}

#[async_trait]
impl EntityStore<ProfileVerification> for InMemoryProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<ProfileVerification>> {
        let tables = self.tables.read().await;
        Ok(tables.verifications.iter().find(|v| v.id == id).cloned())
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<ProfileVerification>> {
        Ok(paginate(&self.tables.read().await.verifications, page))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.verifications.len() as i64)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.verifications.len();
        tables.verifications.retain(|v| v.id != id);
        Ok(tables.verifications.len() != before)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile_with_details(&self, id: Uuid) -> StoreResult<Option<ProfileDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.profile(id).map(|p| tables.details(p)))
    }

    async fn get_profile_by_external_id(
        &self,
        external_user_id: Uuid,
    ) -> StoreResult<Option<ProfileDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .iter()
            .find(|p| p.external_user_id == external_user_id)
            .map(|p| tables.details(p)))
    }

    async fn search_profiles(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<ProfileDetails>, i64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Profile> = tables
            .profiles
            .iter()
            .filter(|p| tables.matches(p, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let rows = paginate(&matching, page)
            .into_iter()
            .map(|p| tables.details(p))
            .collect();
        Ok((rows, total))
    }

    async fn create_profile_with_specialization(
        &self,
        new: NewProfile,
    ) -> StoreResult<ProfileDetails> {
        let mut tables = self.tables.write().await;

        if tables
            .profiles
            .iter()
            .any(|p| p.external_user_id == new.external_user_id)
        {
            return Err(StoreError::conflict("profiles_external_user_id_key"));
        }

        let id = Uuid::new_v4();
        let profile_type = new.kind();
        let specialization = new.specialization.into_record(id);
        tables.check_specialization_unique(&specialization, id)?;

        let now = tables.tick();
        let profile = Profile {
            id,
            external_user_id: new.external_user_id,
            profile_type,
            phone_number: new.contact.phone_number,
            country: new.contact.country,
            city: new.contact.city,
            address: new.contact.address,
            created_at: now,
            updated_at: now,
        };

        tables.profiles.push(profile.clone());
        tables.specializations.insert(id, specialization);
        tables.insert_verification(NewVerification::pending(id));

        Ok(tables.details(&profile))
    }

    async fn update_specialized_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<ProfileDetails>> {
        let mut tables = self.tables.write().await;

        let Some(mut profile) = tables.profile(id).cloned() else {
            return Ok(None);
        };
        let Some(mut specialization) = tables.specializations.get(&id).cloned() else {
            return Ok(None);
        };

        let now = tables.tick();
        if !changes.apply(&mut profile, &mut specialization, now) {
            return Ok(None);
        }
        tables.check_specialization_unique(&specialization, id)?;

        if let Some(slot) = tables.profiles.iter_mut().find(|p| p.id == id) {
            *slot = profile.clone();
        }
        tables.specializations.insert(id, specialization);

        Ok(Some(tables.details(&profile)))
    }

    async fn create_document(&self, new: NewDocument) -> StoreResult<ProfileDocument> {
        let mut tables = self.tables.write().await;
        if tables.profile(new.profile_id).is_none() {
            return Err(StoreError::Backend(format!(
                "profile {} does not exist",
                new.profile_id
            )));
        }

        let document = ProfileDocument {
            id: Uuid::new_v4(),
            profile_id: new.profile_id,
            file_type: new.file_type,
            file_name: new.file_name,
            url: new.url,
            verified: false,
            uploaded_at: tables.tick(),
        };
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn set_document_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<ProfileDocument>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .map(|d| {
                d.verified = verified;
                d.clone()
            }))
    }

    async fn list_documents(&self, profile_id: Uuid) -> StoreResult<Vec<ProfileDocument>> {
        Ok(self.tables.read().await.documents_of(profile_id))
    }

    async fn create_verification(
        &self,
        new: NewVerification,
    ) -> StoreResult<ProfileVerification> {
        let mut tables = self.tables.write().await;
        if tables.profile(new.profile_id).is_none() {
            return Err(StoreError::Backend(format!(
                "profile {} does not exist",
                new.profile_id
            )));
        }
        Ok(tables.insert_verification(new))
    }

    async fn update_verification(
        &self,
        id: Uuid,
        review: &VerificationReview,
    ) -> StoreResult<Option<ProfileVerification>> {
        let mut tables = self.tables.write().await;
        let now = tables.tick();
        Ok(tables
            .verifications
            .iter_mut()
            .find(|v| v.id == id)
            .map(|record| {
                review.apply(record, now);
                record.clone()
            }))
    }

    async fn list_verifications(
        &self,
        profile_id: Uuid,
    ) -> StoreResult<Vec<ProfileVerification>> {
        Ok(self.tables.read().await.verifications_of(profile_id))
    }

    async fn get_latest_verification(
        &self,
        profile_id: Uuid,
    ) -> StoreResult<Option<ProfileVerification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .verifications
            .iter()
            .filter(|v| v.profile_id == profile_id)
            .max_by_key(|v| v.created_at)
            .cloned())
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryProfileStore {
    async fn create_api_key(&self, new: NewApiKey) -> StoreResult<ApiKey> {
        let mut tables = self.tables.write().await;
        if tables.api_keys.iter().any(|k| k.client_id == new.client_id) {
            return Err(StoreError::conflict("api_keys_client_id_key"));
        }

        let key = ApiKey {
            id: tables.api_keys.len() as i64 + 1,
            client_id: new.client_id,
            secret_key_hash: new.secret_key_hash,
            service_name: new.service_name,
            is_active: true,
            created_at: tables.tick(),
        };
        tables.api_keys.push(key.clone());
        Ok(key)
    }

    async fn find_active_api_key(&self, client_id: &str) -> StoreResult<Option<ApiKey>> {
        let tables = self.tables.read().await;
        Ok(tables
            .api_keys
            .iter()
            .find(|k| k.client_id == client_id && k.is_active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactInfo, NewBusiness, NewIndividual, NewSpecialization, ProfileType};

    fn individual(national_id: Option<&str>) -> NewProfile {
        NewProfile {
            external_user_id: Uuid::new_v4(),
            contact: ContactInfo::default(),
            specialization: NewSpecialization::Individual(NewIndividual {
                national_id_number: national_id.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_create_writes_all_three_rows() {
        let store = InMemoryProfileStore::new();
        let details = store
            .create_profile_with_specialization(individual(None))
            .await
            .unwrap();

        assert_eq!(details.profile.profile_type, ProfileType::Individual);
        assert_eq!(
            details.specialization.as_ref().map(|s| s.profile_id()),
            Some(details.profile.id)
        );
        assert_eq!(details.verifications.len(), 1);
        assert_eq!(EntityStore::<Profile>::count(&store).await.unwrap(), 1);
        assert_eq!(
            EntityStore::<ProfileVerification>::count(&store).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_national_id_unique() {
        let store = InMemoryProfileStore::new();
        store
            .create_profile_with_specialization(individual(Some("NID-1")))
            .await
            .unwrap();

        let err = store
            .create_profile_with_specialization(individual(Some("NID-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { ref constraint }
            if constraint == "individual_profiles_national_id_number_key"));
        assert_eq!(EntityStore::<Profile>::count(&store).await.unwrap(), 1);

        // Absent ids never collide
        store
            .create_profile_with_specialization(individual(None))
            .await
            .unwrap();
        store
            .create_profile_with_specialization(individual(None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tax_id_unique() {
        let store = InMemoryProfileStore::new();
        let business = |tax: &str| NewProfile {
            external_user_id: Uuid::new_v4(),
            contact: ContactInfo::default(),
            specialization: NewSpecialization::Business(NewBusiness {
                business_name: "Acme".to_string(),
                tax_id: Some(tax.to_string()),
                ..Default::default()
            }),
        };

        store
            .create_profile_with_specialization(business("TAX-1"))
            .await
            .unwrap();
        let err = store
            .create_profile_with_specialization(business("TAX-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_clock_is_strictly_monotonic() {
        let store = InMemoryProfileStore::new();
        let profile = store
            .create_profile_with_specialization(individual(None))
            .await
            .unwrap();

        let mut previous = profile.verifications[0].created_at;
        for _ in 0..20 {
            let record = store
                .create_verification(NewVerification::pending(profile.id()))
                .await
                .unwrap();
            assert!(record.created_at > previous);
            previous = record.created_at;
        }
    }

    #[tokio::test]
    async fn test_get_all_pages_in_insertion_order() {
        let store = InMemoryProfileStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let details = store
                .create_profile_with_specialization(individual(None))
                .await
                .unwrap();
            ids.push(details.id());
        }

        let page = EntityStore::<Profile>::get_all(
            &store,
            PageRequest {
                limit: 2,
                offset: 1,
            },
        )
        .await
        .unwrap();
        let got: Vec<Uuid> = page.iter().map(|p| p.id).collect();
        assert_eq!(got, ids[1..3].to_vec());
    }

    #[tokio::test]
    async fn test_api_key_lookup_requires_active() {
        let store = InMemoryProfileStore::new();
        store
            .create_api_key(NewApiKey {
                client_id: "cli_abc".to_string(),
                secret_key_hash: "hash".to_string(),
                service_name: "billing".to_string(),
            })
            .await
            .unwrap();

        assert!(store.find_active_api_key("cli_abc").await.unwrap().is_some());
        assert!(store.find_active_api_key("cli_other").await.unwrap().is_none());

        store.tables.write().await.api_keys[0].is_active = false;
        assert!(store.find_active_api_key("cli_abc").await.unwrap().is_none());
    }
}
