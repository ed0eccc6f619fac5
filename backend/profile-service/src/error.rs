/// Error types for Profile Service
///
/// Storage failures, service-level rule violations and the HTTP error body
/// used by the REST endpoints.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Persistence layer failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated (SQLSTATE 23505)
    #[error("unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(constraint: impl Into<String>) -> Self {
        StoreError::Conflict {
            constraint: constraint.into(),
        }
    }

    /// Map a driver error, pulling out unique violations.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::conflict(db_err.constraint().unwrap_or("unknown"));
            }
        }
        StoreError::Database(err)
    }
}

/// Profile service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Profile already exists for this user")]
    ProfileAlreadyExists,

    #[error("Business name is required for business profiles")]
    BusinessNameRequired,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Profile kind without matching specialization row
    #[error("Profile {profile_id} of type {profile_type} has no matching specialization")]
    MissingSpecialization {
        profile_id: uuid::Uuid,
        profile_type: &'static str,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Expected rule violations whose message can be shown to callers.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            ServiceError::ProfileAlreadyExists
                | ServiceError::BusinessNameRequired
                | ServiceError::ProfileNotFound
                | ServiceError::InvalidInput(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::ProfileAlreadyExists => "PROFILE_ALREADY_EXISTS",
            ServiceError::BusinessNameRequired => "BUSINESS_NAME_REQUIRED",
            ServiceError::ProfileNotFound => "PROFILE_NOT_FOUND",
            ServiceError::InvalidInput(_) => "INVALID_INPUT",
            ServiceError::MissingSpecialization { .. } => "DATA_INTEGRITY",
            ServiceError::Internal(_) | ServiceError::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to API callers.
    pub fn public_message(&self) -> String {
        if self.is_domain() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        ServiceError::InvalidInput(format!("invalid value for {}", fields.join(", ")))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ProfileAlreadyExists => StatusCode::CONFLICT,
            ServiceError::BusinessNameRequired | ServiceError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::ProfileNotFound => StatusCode::NOT_FOUND,
            ServiceError::MissingSpecialization { .. }
            | ServiceError::Internal(_)
            | ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.code(), &self.public_message())
    }
}

/// Errors raised by the HTTP layer itself
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Unauthorized(msg) => error_body(self.status_code(), "UNAUTHORIZED", msg),
            ApiError::Internal(_) => error_body(
                self.status_code(),
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        }
    }
}

fn error_body(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": {
            "code": code,
            "message": message,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_classification() {
        assert!(ServiceError::ProfileAlreadyExists.is_domain());
        assert!(ServiceError::BusinessNameRequired.is_domain());
        assert!(ServiceError::InvalidInput("x".into()).is_domain());
        assert!(!ServiceError::Store(StoreError::Backend("boom".into())).is_domain());
        assert!(!ServiceError::MissingSpecialization {
            profile_id: uuid::Uuid::nil(),
            profile_type: "INDIVIDUAL",
        }
        .is_domain());
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = ServiceError::Store(StoreError::conflict("profiles_external_user_id_key"));
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            ServiceError::ProfileAlreadyExists.public_message(),
            "Profile already exists for this user"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::ProfileNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::InvalidInput("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("Missing API credentials").status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
