//! API key authentication middleware
//!
//! Callers present a previously issued client id and secret in two headers.
//! On success the verified `ApiClient` is stored in request extensions.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use tracing::error;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::services::ApiKeyService;

pub struct ApiKeyAuth {
    api_keys: ApiKeyService,
    auth: AuthConfig,
}

impl ApiKeyAuth {
    pub fn new(api_keys: ApiKeyService, auth: AuthConfig) -> Self {
        Self { api_keys, auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            api_keys: self.api_keys.clone(),
            auth: self.auth.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    api_keys: ApiKeyService,
    auth: AuthConfig,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client_id = header_value(&req, &self.auth.api_key_header);
        let secret = header_value(&req, &self.auth.api_secret_header);
        let service = Rc::clone(&self.service);
        let api_keys = self.api_keys.clone();

        Box::pin(async move {
            let (Some(client_id), Some(secret)) = (client_id, secret) else {
                return Ok(reject(req, ApiError::Unauthorized("Missing API credentials")));
            };

            match api_keys.authenticate(&client_id, &secret).await {
                Ok(Some(client)) => {
                    req.extensions_mut().insert(client);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Ok(None) => Ok(reject(req, ApiError::Unauthorized("Invalid API credentials"))),
                Err(e) => {
                    error!(client_id = %client_id, error = %e, "API key verification failed");
                    Ok(reject(req, ApiError::Internal(e.to_string())))
                }
            }
        })
    }
}

fn header_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn reject<B>(req: ServiceRequest, err: ApiError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(err.error_response()).map_into_right_body()
}
