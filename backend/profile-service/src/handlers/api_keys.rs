use actix_web::{web, HttpResponse};

use crate::error::ServiceError;
use crate::models::CreateApiKeyRequest;
use crate::services::ApiKeyService;

/// Issue a new credential pair. The secret is only ever returned here.
pub async fn create_api_key(
    api_keys: web::Data<ApiKeyService>,
    body: web::Json<CreateApiKeyRequest>,
) -> Result<HttpResponse, ServiceError> {
    let issued = api_keys.issue(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "client_id": issued.client_id,
        "secret_key": issued.secret_key,
        "service_name": issued.service_name,
        "message": "Store the secret key securely. It will not be shown again.",
    })))
}
