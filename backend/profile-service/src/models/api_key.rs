use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Stored credential pair; only a hash of the secret is kept
#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    pub id: i64,
    pub client_id: String,
    pub secret_key_hash: String,
    pub service_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub client_id: String,
    pub secret_key_hash: String,
    pub service_name: String,
}

/// Authenticated caller, attached to requests that passed the API-key check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClient {
    pub client_id: String,
    pub service_name: String,
}

impl From<&ApiKey> for ApiClient {
    fn from(key: &ApiKey) -> Self {
        Self {
            client_id: key.client_id.clone(),
            service_name: key.service_name.clone(),
        }
    }
}

/// Body of a credential issuance request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100))]
    pub service_name: String,
}
