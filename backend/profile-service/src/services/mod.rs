//! Business logic layer

pub mod api_keys;
pub mod profile_service;

pub use api_keys::{ApiKeyService, IssuedApiKey};
pub use profile_service::ProfileService;
