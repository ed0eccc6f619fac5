/// API credential issuance and verification using Argon2id
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::db::ApiKeyStore;
use crate::error::{Result, ServiceError};
use crate::models::{ApiClient, CreateApiKeyRequest, NewApiKey};

const CLIENT_ID_PREFIX: &str = "cli_";
const SECRET_PREFIX: &str = "sk_";

/// Freshly issued credential pair. The secret is never retrievable again.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    pub client_id: String,
    pub secret_key: String,
    pub service_name: String,
}

#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }

    pub async fn issue(&self, request: CreateApiKeyRequest) -> Result<IssuedApiKey> {
        let request = CreateApiKeyRequest {
            service_name: request.service_name.trim().to_string(),
        };
        request.validate()?;

        let client_id = generate_client_id();
        let secret_key = generate_secret();

        let secret = secret_key.clone();
        let secret_key_hash = tokio::task::spawn_blocking(move || hash_secret(&secret))
            .await
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))??;

        let key = self
            .store
            .create_api_key(NewApiKey {
                client_id,
                secret_key_hash,
                service_name: request.service_name,
            })
            .await?;

        info!(
            client_id = %key.client_id,
            service_name = %key.service_name,
            "API key issued"
        );

        Ok(IssuedApiKey {
            client_id: key.client_id,
            secret_key,
            service_name: key.service_name,
        })
    }

    /// `None` when the client is unknown, inactive or the secret is wrong.
    pub async fn authenticate(&self, client_id: &str, secret: &str) -> Result<Option<ApiClient>> {
        let Some(key) = self.store.find_active_api_key(client_id).await? else {
            warn!(client_id = %client_id, "Unknown or inactive API client");
            return Ok(None);
        };

        let hash = key.secret_key_hash.clone();
        let secret = secret.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_secret(&secret, &hash))
            .await
            .map_err(|e| ServiceError::Internal(format!("verification task failed: {}", e)))??;

        if !valid {
            warn!(client_id = %client_id, "API secret mismatch");
            return Ok(None);
        }
        Ok(Some(ApiClient::from(&key)))
    }
}

fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// `cli_` followed by 32 hex characters
pub fn generate_client_id() -> String {
    format!("{}{}", CLIENT_ID_PREFIX, random_hex::<16>())
}

/// `sk_` followed by 64 hex characters
pub fn generate_secret() -> String {
    format!("{}{}", SECRET_PREFIX, random_hex::<32>())
}

pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("secret hashing failed: {}", e)))
}

pub fn verify_secret(secret: &str, secret_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(secret_hash)
        .map_err(|e| ServiceError::Internal(format!("invalid secret hash format: {}", e)))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ServiceError::Internal(format!(
            "secret verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryProfileStore;

    #[test]
    fn test_credential_shapes() {
        let client_id = generate_client_id();
        assert!(client_id.starts_with("cli_"));
        assert_eq!(client_id.len(), 4 + 32);

        let secret = generate_secret();
        assert!(secret.starts_with("sk_"));
        assert_eq!(secret.len(), 3 + 64);
        assert!(secret[3..].chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_secret("sk_test").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("sk_test", &hash).unwrap());
        assert!(!verify_secret("sk_wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_issue_then_authenticate() {
        let service = ApiKeyService::new(Arc::new(InMemoryProfileStore::new()));
        let issued = service
            .issue(CreateApiKeyRequest {
                service_name: "  billing ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(issued.service_name, "billing");

        let client = service
            .authenticate(&issued.client_id, &issued.secret_key)
            .await
            .unwrap()
            .expect("credentials should authenticate");
        assert_eq!(client.service_name, "billing");

        assert!(service
            .authenticate(&issued.client_id, "sk_nope")
            .await
            .unwrap()
            .is_none());
        assert!(service
            .authenticate("cli_unknown", &issued.secret_key)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_issue_rejects_blank_service_name() {
        let service = ApiKeyService::new(Arc::new(InMemoryProfileStore::new()));
        let err = service
            .issue(CreateApiKeyRequest {
                service_name: "   ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
