//! GraphQL schema
//!
//! Queries and mutations over the profile aggregate, merged into the
//! service's root objects.

pub mod inputs;
pub mod mutation;
pub mod query;
pub mod types;

use async_graphql::{EmptySubscription, ErrorExtensions, MergedObject, Schema};
use tracing::error;

use crate::config::GraphQLConfig;
use crate::error::ServiceError;
use crate::services::ProfileService;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(query::ProfileQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(mutation::ProfileMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with depth and complexity limits from configuration
pub fn build_schema(service: ProfileService, config: &GraphQLConfig) -> AppSchema {
    let builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(service)
    .limit_depth(config.max_depth)
    .limit_complexity(config.max_complexity);

    if config.introspection {
        builder.finish()
    } else {
        builder.disable_introspection().finish()
    }
}

/// GraphQL error for a failed query. Unexpected failures are logged and
/// reported with a generic message.
pub(crate) fn service_error(operation: &str, err: ServiceError) -> async_graphql::Error {
    if !err.is_domain() {
        error!(operation, error = %err, "Query failed");
    }
    let code = err.code();
    async_graphql::Error::new(err.public_message())
        .extend_with(|_, e| e.set("code", code))
}
