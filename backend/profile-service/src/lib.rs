pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;

use std::sync::Arc;

use config::{AuthConfig, GraphQLConfig};
use db::{ApiKeyStore, ProfileStore};
use handlers::AppState;
use services::{ApiKeyService, ProfileService};

/// Wire services and schema over the given stores.
pub fn build_state(
    profiles: Arc<dyn ProfileStore>,
    api_keys: Arc<dyn ApiKeyStore>,
    auth: AuthConfig,
    graphql: GraphQLConfig,
) -> AppState {
    let schema = schema::build_schema(ProfileService::new(profiles), &graphql);
    AppState {
        schema,
        api_keys: ApiKeyService::new(api_keys),
        auth,
        graphql,
    }
}
