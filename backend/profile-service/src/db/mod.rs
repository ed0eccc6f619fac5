//! Persistence gateway
//!
//! Store contracts are traits so the service can run over Postgres in
//! production and over the in-memory store in tests.

mod memory;
mod postgres;

pub use memory::InMemoryProfileStore;
pub use postgres::{create_pool, DbConfig, PgProfileStore};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ApiKey, NewApiKey, NewDocument, NewProfile, NewVerification, Profile, ProfileChanges,
    ProfileDetails, ProfileDocument, ProfileType, ProfileVerification, VerificationReview,
    VerificationStatus,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Independent, combinable search filters. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFilter {
    pub profile_type: Option<ProfileType>,
    /// Case-insensitive substring
    pub country: Option<String>,
    /// Case-insensitive substring
    pub city: Option<String>,
    /// Profile has at least one verification record with this status
    pub verification_status: Option<VerificationStatus>,
    /// Case-insensitive substring of phone number or address
    pub search: Option<String>,
}

impl ProfileFilter {
    pub fn country(&self) -> Option<&str> {
        non_empty(self.country.as_deref())
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(self.city.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Generic contract over one entity type
#[async_trait]
pub trait EntityStore<E>: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<E>>;

    /// Stable page in insertion order
    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<E>>;

    async fn count(&self) -> StoreResult<i64>;

    /// Removes the entity and everything it owns. `false` when absent.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Profile aggregate persistence
#[async_trait]
pub trait ProfileStore:
    EntityStore<Profile> + EntityStore<ProfileDocument> + EntityStore<ProfileVerification>
{
    async fn get_profile_with_details(&self, id: Uuid) -> StoreResult<Option<ProfileDetails>>;

    async fn get_profile_by_external_id(
        &self,
        external_user_id: Uuid,
    ) -> StoreResult<Option<ProfileDetails>>;

    /// Page of matching profiles (newest first) plus the total match count.
    async fn search_profiles(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<ProfileDetails>, i64)>;

    /// Profile, specialization and initial PENDING verification in one transaction.
    async fn create_profile_with_specialization(
        &self,
        new: NewProfile,
    ) -> StoreResult<ProfileDetails>;

    /// `None` when the profile is absent or not of the kind `changes` targets.
    async fn update_specialized_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<ProfileDetails>>;

    async fn create_document(&self, new: NewDocument) -> StoreResult<ProfileDocument>;

    async fn set_document_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<ProfileDocument>>;

    /// Upload order
    async fn list_documents(&self, profile_id: Uuid) -> StoreResult<Vec<ProfileDocument>>;

    /// Stamps `reviewed_at` when a reviewer is given.
    async fn create_verification(&self, new: NewVerification)
        -> StoreResult<ProfileVerification>;

    /// Always stamps `reviewed_at`.
    async fn update_verification(
        &self,
        id: Uuid,
        review: &VerificationReview,
    ) -> StoreResult<Option<ProfileVerification>>;

    /// Newest first
    async fn list_verifications(&self, profile_id: Uuid)
        -> StoreResult<Vec<ProfileVerification>>;

    async fn get_latest_verification(
        &self,
        profile_id: Uuid,
    ) -> StoreResult<Option<ProfileVerification>>;
}

/// Issued API credentials
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn create_api_key(&self, new: NewApiKey) -> StoreResult<ApiKey>;

    async fn find_active_api_key(&self, client_id: &str) -> StoreResult<Option<ApiKey>>;
}
