use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::config::GraphQLConfig;
use crate::models::ApiClient;
use crate::schema::AppSchema;

/// Execute a GraphQL request on behalf of the authenticated client
pub async fn graphql(
    schema: web::Data<AppSchema>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    let client = http_req.extensions().get::<ApiClient>().cloned();
    if let Some(client) = client {
        request = request.data(client);
    }
    schema.execute(request).await.into()
}

pub async fn playground(config: web::Data<GraphQLConfig>) -> HttpResponse {
    if !config.playground {
        return HttpResponse::NotFound().finish();
    }
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// SDL for client code generation
pub async fn schema_sdl(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}
