//! HTTP handlers and route table

pub mod api_keys;
pub mod graphql;
pub mod health;

use actix_web::web;

use crate::config::{AuthConfig, GraphQLConfig};
use crate::middleware::ApiKeyAuth;
use crate::schema::AppSchema;
use crate::services::ApiKeyService;

/// Everything the routes need, built once at start-up
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub api_keys: ApiKeyService,
    pub auth: AuthConfig,
    pub graphql: GraphQLConfig,
}

/// Register all routes. Only `POST /graphql` requires API credentials.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.schema.clone()))
        .app_data(web::Data::new(state.api_keys.clone()))
        .app_data(web::Data::new(state.graphql.clone()))
        .route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health))
        .route("/api-keys", web::post().to(api_keys::create_api_key))
        .route("/graphql/schema", web::get().to(graphql::schema_sdl))
        .service(
            web::resource("/graphql")
                .route(
                    web::post()
                        .to(graphql::graphql)
                        .wrap(ApiKeyAuth::new(state.api_keys.clone(), state.auth.clone())),
                )
                .route(web::get().to(graphql::playground)),
        );
}
