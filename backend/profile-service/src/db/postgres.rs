//! PostgreSQL store
//!
//! Multi-row writes run in one transaction. Details are eager-loaded in
//! batches keyed by `= ANY($1)` so a page costs a fixed number of queries.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{
    ApiKeyStore, EntityStore, PageRequest, ProfileFilter, ProfileStore, StoreResult,
};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::{
    ApiKey, BusinessProfile, IndividualProfile, NewApiKey, NewDocument, NewProfile,
    NewVerification, Profile, ProfileChanges, ProfileDetails, ProfileDocument, ProfileType,
    ProfileVerification, Specialization, VerificationReview,
};

// ============================================================================
// Pool
// ============================================================================

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// New connection to PostgreSQL, also bounds the start-up check
    pub connect_timeout_secs: u64,
    /// Getting a connection from the pool
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl From<&DatabaseConfig> for DbConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            database_url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            acquire_timeout_secs: config.acquire_timeout_secs,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Create a PostgreSQL connection pool and verify it with `SELECT 1`
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        max = config.max_connections,
        min = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!("Database pool created and verified successfully");
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

// ============================================================================
// Store
// ============================================================================

const PROFILE_COLUMNS: &str = "id, external_user_id, profile_type, phone_number, country, city, \
     address, created_at, updated_at";

const SEARCH_PREDICATE: &str = r#"
    ($1::profile_type IS NULL OR p.profile_type = $1)
    AND ($2::text IS NULL OR p.country ILIKE $2)
    AND ($3::text IS NULL OR p.city ILIKE $3)
    AND ($4::verification_status IS NULL OR EXISTS (
        SELECT 1 FROM profile_verifications v
        WHERE v.profile_id = p.id AND v.status = $4
    ))
    AND ($5::text IS NULL OR p.phone_number ILIKE $5 OR p.address ILIKE $5)
"#;

/// `%term%` with LIKE wildcards in `term` taken literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach specialization, documents and verifications to each profile.
    async fn load_details(&self, profiles: Vec<Profile>) -> StoreResult<Vec<ProfileDetails>> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();

        let individuals: Vec<IndividualProfile> = sqlx::query_as(
            "SELECT id, first_name, last_name, date_of_birth, gender, national_id_number \
             FROM individual_profiles WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let businesses: Vec<BusinessProfile> = sqlx::query_as(
            "SELECT id, business_name, registration_number, tax_id, legal_representative_name \
             FROM business_profiles WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let documents: Vec<ProfileDocument> = sqlx::query_as(
            "SELECT id, profile_id, file_type, file_name, url, verified, uploaded_at \
             FROM profile_documents WHERE profile_id = ANY($1) \
             ORDER BY uploaded_at ASC, id ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let verifications: Vec<ProfileVerification> = sqlx::query_as(
            "SELECT id, profile_id, status, reviewed_by, reviewed_at, notes, created_at \
             FROM profile_verifications WHERE profile_id = ANY($1) \
             ORDER BY created_at DESC, id ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let mut specializations: HashMap<Uuid, Specialization> = HashMap::new();
        for ind in individuals {
            specializations.insert(ind.id, Specialization::Individual(ind));
        }
        for bus in businesses {
            specializations.insert(bus.id, Specialization::Business(bus));
        }

        let mut documents_by_profile: HashMap<Uuid, Vec<ProfileDocument>> = HashMap::new();
        for doc in documents {
            documents_by_profile.entry(doc.profile_id).or_default().push(doc);
        }

        let mut verifications_by_profile: HashMap<Uuid, Vec<ProfileVerification>> =
            HashMap::new();
        for record in verifications {
            verifications_by_profile
                .entry(record.profile_id)
                .or_default()
                .push(record);
        }

        Ok(profiles
            .into_iter()
            .map(|profile| ProfileDetails {
                specialization: specializations.remove(&profile.id),
                documents: documents_by_profile.remove(&profile.id).unwrap_or_default(),
                verifications: verifications_by_profile
                    .remove(&profile.id)
                    .unwrap_or_default(),
                profile,
            })
            .collect())
    }

    async fn load_one(&self, profile: Option<Profile>) -> StoreResult<Option<ProfileDetails>> {
        match profile {
            Some(profile) => Ok(self.load_details(vec![profile]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn reload(&self, id: Uuid) -> StoreResult<ProfileDetails> {
        self.get_profile_with_details(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("profile {} vanished after write", id)))
    }

    async fn insert_specialization(
        tx: &mut Transaction<'_, Postgres>,
        specialization: &Specialization,
    ) -> StoreResult<()> {
        match specialization {
            Specialization::Individual(ind) => {
                sqlx::query(
                    r#"
                    INSERT INTO individual_profiles (
                        id, first_name, last_name, date_of_birth, gender, national_id_number
                    ) VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(ind.id)
                .bind(&ind.first_name)
                .bind(&ind.last_name)
                .bind(ind.date_of_birth)
                .bind(ind.gender)
                .bind(&ind.national_id_number)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::from_sqlx)?;
            }
            Specialization::Business(bus) => {
                sqlx::query(
                    r#"
                    INSERT INTO business_profiles (
                        id, business_name, registration_number, tax_id, legal_representative_name
                    ) VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(bus.id)
                .bind(&bus.business_name)
                .bind(&bus.registration_number)
                .bind(&bus.tax_id)
                .bind(&bus.legal_representative_name)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::from_sqlx)?;
            }
        }
        Ok(())
    }

    async fn save_specialization(
        tx: &mut Transaction<'_, Postgres>,
        specialization: &Specialization,
    ) -> StoreResult<()> {
        match specialization {
            Specialization::Individual(ind) => {
                sqlx::query(
                    r#"
                    UPDATE individual_profiles
                    SET first_name = $2, last_name = $3, date_of_birth = $4,
                        gender = $5, national_id_number = $6
                    WHERE id = $1
                    "#,
                )
                .bind(ind.id)
                .bind(&ind.first_name)
                .bind(&ind.last_name)
                .bind(ind.date_of_birth)
                .bind(ind.gender)
                .bind(&ind.national_id_number)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::from_sqlx)?;
            }
            Specialization::Business(bus) => {
                sqlx::query(
                    r#"
                    UPDATE business_profiles
                    SET business_name = $2, registration_number = $3, tax_id = $4,
                        legal_representative_name = $5
                    WHERE id = $1
                    "#,
                )
                .bind(bus.id)
                .bind(&bus.business_name)
                .bind(&bus.registration_number)
                .bind(&bus.tax_id)
                .bind(&bus.legal_representative_name)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::from_sqlx)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore<Profile> for PgProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<Profile>> {
        let sql = format!(
            "SELECT {} FROM profiles ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            PROFILE_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        // Owned rows go with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EntityStore<ProfileDocument> for PgProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<ProfileDocument>> {
        sqlx::query_as(
            "SELECT id, profile_id, file_type, file_name, url, verified, uploaded_at \
             FROM profile_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<ProfileDocument>> {
        sqlx::query_as(
            "SELECT id, profile_id, file_type, file_name, url, verified, uploaded_at \
             FROM profile_documents ORDER BY uploaded_at ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM profile_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM profile_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EntityStore<ProfileVerification> for PgProfileStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<ProfileVerification>> {
        sqlx::query_as(
            "SELECT id, profile_id, status, reviewed_by, reviewed_at, notes, created_at \
             FROM profile_verifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn get_all(&self, page: PageRequest) -> StoreResult<Vec<ProfileVerification>> {
        sqlx::query_as(
            "SELECT id, profile_id, status, reviewed_by, reviewed_at, notes, created_at \
             FROM profile_verifications ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM profile_verifications")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM profile_verifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile_with_details(&self, id: Uuid) -> StoreResult<Option<ProfileDetails>> {
        let profile = EntityStore::<Profile>::get_by_id(self, id).await?;
        self.load_one(profile).await
    }

    async fn get_profile_by_external_id(
        &self,
        external_user_id: Uuid,
    ) -> StoreResult<Option<ProfileDetails>> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE external_user_id = $1",
            PROFILE_COLUMNS
        );
        let profile: Option<Profile> = sqlx::query_as(&sql)
            .bind(external_user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        self.load_one(profile).await
    }

    async fn search_profiles(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<ProfileDetails>, i64)> {
        let country = filter.country().map(like_pattern);
        let city = filter.city().map(like_pattern);
        let search = filter.search().map(like_pattern);

        let page_sql = format!(
            "SELECT {} FROM profiles p WHERE {} \
             ORDER BY p.created_at DESC, p.id ASC LIMIT $6 OFFSET $7",
            PROFILE_COLUMNS
                .split(", ")
                .map(|c| format!("p.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
            SEARCH_PREDICATE
        );
        let profiles: Vec<Profile> = sqlx::query_as(&page_sql)
            .bind(filter.profile_type)
            .bind(&country)
            .bind(&city)
            .bind(filter.verification_status)
            .bind(&search)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let count_sql = format!("SELECT COUNT(*) FROM profiles p WHERE {}", SEARCH_PREDICATE);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.profile_type)
            .bind(&country)
            .bind(&city)
            .bind(filter.verification_status)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let details = self.load_details(profiles).await?;
        Ok((details, total))
    }

    async fn create_profile_with_specialization(
        &self,
        new: NewProfile,
    ) -> StoreResult<ProfileDetails> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let profile_type: ProfileType = new.kind();

        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, external_user_id, profile_type, phone_number, country, city,
                address, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(new.external_user_id)
        .bind(profile_type)
        .bind(&new.contact.phone_number)
        .bind(&new.contact.country)
        .bind(&new.contact.city)
        .bind(&new.contact.address)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        let specialization = new.specialization.into_record(id);
        Self::insert_specialization(&mut tx, &specialization).await?;

        sqlx::query(
            r#"
            INSERT INTO profile_verifications (id, profile_id, status, created_at)
            VALUES ($1, $2, 'PENDING', $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        debug!(profile_id = %id, profile_type = profile_type.as_str(), "Profile rows committed");
        self.reload(id).await
    }

    async fn update_specialized_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<ProfileDetails>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

        let sql = format!(
            "SELECT {} FROM profiles WHERE id = $1 FOR UPDATE",
            PROFILE_COLUMNS
        );
        let Some(mut profile) = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?
        else {
            return Ok(None);
        };

        if profile.profile_type != changes.kind() {
            return Ok(None);
        }

        let specialization = match profile.profile_type {
            ProfileType::Individual => sqlx::query_as::<_, IndividualProfile>(
                "SELECT id, first_name, last_name, date_of_birth, gender, national_id_number \
                 FROM individual_profiles WHERE id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?
            .map(Specialization::Individual),
            ProfileType::Business => sqlx::query_as::<_, BusinessProfile>(
                "SELECT id, business_name, registration_number, tax_id, legal_representative_name \
                 FROM business_profiles WHERE id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?
            .map(Specialization::Business),
        };
        let Some(mut specialization) = specialization else {
            return Ok(None);
        };

        if !changes.apply(&mut profile, &mut specialization, Utc::now()) {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE profiles
            SET phone_number = $2, country = $3, city = $4, address = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&profile.phone_number)
        .bind(&profile.country)
        .bind(&profile.city)
        .bind(&profile.address)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        Self::save_specialization(&mut tx, &specialization).await?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        Ok(Some(self.reload(id).await?))
    }

    async fn create_document(&self, new: NewDocument) -> StoreResult<ProfileDocument> {
        sqlx::query_as(
            r#"
            INSERT INTO profile_documents (id, profile_id, file_type, file_name, url, verified, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING id, profile_id, file_type, file_name, url, verified, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.profile_id)
        .bind(new.file_type)
        .bind(&new.file_name)
        .bind(&new.url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn set_document_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<ProfileDocument>> {
        sqlx::query_as(
            r#"
            UPDATE profile_documents SET verified = $2 WHERE id = $1
            RETURNING id, profile_id, file_type, file_name, url, verified, uploaded_at
            "#,
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn list_documents(&self, profile_id: Uuid) -> StoreResult<Vec<ProfileDocument>> {
        sqlx::query_as(
            "SELECT id, profile_id, file_type, file_name, url, verified, uploaded_at \
             FROM profile_documents WHERE profile_id = $1 ORDER BY uploaded_at ASC, id ASC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn create_verification(
        &self,
        new: NewVerification,
    ) -> StoreResult<ProfileVerification> {
        let now = Utc::now();
        let reviewed_at = new.reviewed_by.as_ref().map(|_| now);

        sqlx::query_as(
            r#"
            INSERT INTO profile_verifications (
                id, profile_id, status, reviewed_by, reviewed_at, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, profile_id, status, reviewed_by, reviewed_at, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.profile_id)
        .bind(new.status)
        .bind(&new.reviewed_by)
        .bind(reviewed_at)
        .bind(&new.notes)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn update_verification(
        &self,
        id: Uuid,
        review: &VerificationReview,
    ) -> StoreResult<Option<ProfileVerification>> {
        sqlx::query_as(
            r#"
            UPDATE profile_verifications
            SET status = $2,
                reviewed_by = COALESCE($3, reviewed_by),
                notes = COALESCE($4, notes),
                reviewed_at = $5
            WHERE id = $1
            RETURNING id, profile_id, status, reviewed_by, reviewed_at, notes, created_at
            "#,
        )
        .bind(id)
        .bind(review.status)
        .bind(&review.reviewed_by)
        .bind(&review.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn list_verifications(
        &self,
        profile_id: Uuid,
    ) -> StoreResult<Vec<ProfileVerification>> {
        sqlx::query_as(
            "SELECT id, profile_id, status, reviewed_by, reviewed_at, notes, created_at \
             FROM profile_verifications WHERE profile_id = $1 \
             ORDER BY created_at DESC, id ASC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn get_latest_verification(
        &self,
        profile_id: Uuid,
    ) -> StoreResult<Option<ProfileVerification>> {
        sqlx::query_as(
            "SELECT id, profile_id, status, reviewed_by, reviewed_at, notes, created_at \
             FROM profile_verifications WHERE profile_id = $1 \
             ORDER BY created_at DESC, id ASC LIMIT 1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}

#[async_trait]
impl ApiKeyStore for PgProfileStore {
    async fn create_api_key(&self, new: NewApiKey) -> StoreResult<ApiKey> {
        sqlx::query_as(
            r#"
            INSERT INTO api_keys (client_id, secret_key_hash, service_name)
            VALUES ($1, $2, $3)
            RETURNING id, client_id, secret_key_hash, service_name, is_active, created_at
            "#,
        )
        .bind(&new.client_id)
        .bind(&new.secret_key_hash)
        .bind(&new.service_name)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn find_active_api_key(&self, client_id: &str) -> StoreResult<Option<ApiKey>> {
        sqlx::query_as(
            "SELECT id, client_id, secret_key_hash, service_name, is_active, created_at \
             FROM api_keys WHERE client_id = $1 AND is_active = TRUE",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}
