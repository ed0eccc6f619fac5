//! Profile mutations
//!
//! Failures are reported in the response envelope. Only malformed ids
//! surface as GraphQL errors.

use async_graphql::{Context, Object, Result as GraphQLResult, ID};
use tracing::{error, info};

use super::inputs::{
    parse_id, CreateBusinessProfileInput, CreateIndividualProfileInput,
    UpdateBusinessProfileInput, UpdateIndividualProfileInput, UpdateVerificationInput,
    UploadDocumentInput, VerifyDocumentInput, VerifyProfileInput,
};
use super::types::{DeleteResponse, DocumentResponse, ProfileResponse, VerificationResponse};
use crate::error::ServiceError;
use crate::models::ApiClient;
use crate::services::ProfileService;

fn service<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a ProfileService> {
    ctx.data::<ProfileService>()
        .map_err(|_| "Profile service not available".into())
}

fn caller(ctx: &Context<'_>) -> String {
    ctx.data_opt::<ApiClient>()
        .map(|c| c.client_id.clone())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Caller-facing message; unexpected failures are logged and flattened.
fn failure(operation: &str, err: ServiceError) -> String {
    if !err.is_domain() {
        error!(operation, error = %err, "Mutation failed");
    }
    err.public_message()
}

fn profile_ok(message: &str, profile: super::types::ProfileUnion) -> ProfileResponse {
    ProfileResponse {
        success: true,
        message: message.to_string(),
        profile: Some(profile),
    }
}

fn profile_failed(message: String) -> ProfileResponse {
    ProfileResponse {
        success: false,
        message,
        profile: None,
    }
}

fn document_failed(message: String) -> DocumentResponse {
    DocumentResponse {
        success: false,
        message,
        document: None,
    }
}

fn verification_failed(message: String) -> VerificationResponse {
    VerificationResponse {
        success: false,
        message,
        verification: None,
    }
}

fn deleted(success: bool, found: &str, missing: &str) -> DeleteResponse {
    DeleteResponse {
        success,
        message: if success { found } else { missing }.to_string(),
    }
}

#[derive(Default)]
pub struct ProfileMutation;

#[Object]
impl ProfileMutation {
    async fn create_individual_profile(
        &self,
        ctx: &Context<'_>,
        input: CreateIndividualProfileInput,
    ) -> GraphQLResult<ProfileResponse> {
        let (external_user_id, contact, individual) = input.into_parts()?;
        info!(client_id = %caller(ctx), external_user_id = %external_user_id, "createIndividualProfile");

        Ok(
            match service(ctx)?
                .create_individual_profile(external_user_id, contact, individual)
                .await
            {
                Ok(profile) => profile_ok("Individual profile created successfully", profile),
                Err(e) => profile_failed(failure("createIndividualProfile", e)),
            },
        )
    }

    async fn create_business_profile(
        &self,
        ctx: &Context<'_>,
        input: CreateBusinessProfileInput,
    ) -> GraphQLResult<ProfileResponse> {
        let (external_user_id, contact, business) = input.into_parts()?;
        info!(client_id = %caller(ctx), external_user_id = %external_user_id, "createBusinessProfile");

        Ok(
            match service(ctx)?
                .create_business_profile(external_user_id, contact, business)
                .await
            {
                Ok(profile) => profile_ok("Business profile created successfully", profile),
                Err(e) => profile_failed(failure("createBusinessProfile", e)),
            },
        )
    }

    async fn update_individual_profile(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateIndividualProfileInput,
    ) -> GraphQLResult<ProfileResponse> {
        let id = parse_id(&id, "id")?;
        let (contact, changes) = input.into_changes();
        info!(client_id = %caller(ctx), profile_id = %id, "updateIndividualProfile");

        Ok(
            match service(ctx)?
                .update_individual_profile(id, contact, changes)
                .await
            {
                Ok(Some(profile)) => profile_ok("Individual profile updated successfully", profile),
                Ok(None) => profile_failed("Individual profile not found".to_string()),
                Err(e) => profile_failed(failure("updateIndividualProfile", e)),
            },
        )
    }

    async fn update_business_profile(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateBusinessProfileInput,
    ) -> GraphQLResult<ProfileResponse> {
        let id = parse_id(&id, "id")?;
        let (contact, changes) = input.into_changes();
        info!(client_id = %caller(ctx), profile_id = %id, "updateBusinessProfile");

        Ok(
            match service(ctx)?
                .update_business_profile(id, contact, changes)
                .await
            {
                Ok(Some(profile)) => profile_ok("Business profile updated successfully", profile),
                Ok(None) => profile_failed("Business profile not found".to_string()),
                Err(e) => profile_failed(failure("updateBusinessProfile", e)),
            },
        )
    }

    async fn delete_profile(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<DeleteResponse> {
        let id = parse_id(&id, "id")?;
        info!(client_id = %caller(ctx), profile_id = %id, "deleteProfile");

        Ok(match service(ctx)?.delete_profile(id).await {
            Ok(found) => deleted(found, "Profile deleted successfully", "Profile not found"),
            Err(e) => DeleteResponse {
                success: false,
                message: failure("deleteProfile", e),
            },
        })
    }

    async fn upload_profile_document(
        &self,
        ctx: &Context<'_>,
        input: UploadDocumentInput,
    ) -> GraphQLResult<DocumentResponse> {
        let new = input.into_new()?;
        info!(client_id = %caller(ctx), profile_id = %new.profile_id, "uploadProfileDocument");

        Ok(match service(ctx)?.upload_document(new).await {
            Ok(document) => DocumentResponse {
                success: true,
                message: "Document uploaded successfully".to_string(),
                document: Some(document),
            },
            Err(e) => document_failed(failure("uploadProfileDocument", e)),
        })
    }

    async fn verify_document(
        &self,
        ctx: &Context<'_>,
        input: VerifyDocumentInput,
    ) -> GraphQLResult<DocumentResponse> {
        let id = parse_id(&input.document_id, "documentId")?;
        info!(client_id = %caller(ctx), document_id = %id, verified = input.verified, "verifyDocument");

        Ok(
            match service(ctx)?.verify_document(id, input.verified).await {
                Ok(Some(document)) => DocumentResponse {
                    success: true,
                    message: if input.verified {
                        "Document verified successfully"
                    } else {
                        "Document rejected successfully"
                    }
                    .to_string(),
                    document: Some(document),
                },
                Ok(None) => document_failed("Document not found".to_string()),
                Err(e) => document_failed(failure("verifyDocument", e)),
            },
        )
    }

    async fn delete_document(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<DeleteResponse> {
        let id = parse_id(&id, "id")?;
        info!(client_id = %caller(ctx), document_id = %id, "deleteDocument");

        Ok(match service(ctx)?.delete_document(id).await {
            Ok(found) => deleted(found, "Document deleted successfully", "Document not found"),
            Err(e) => DeleteResponse {
                success: false,
                message: failure("deleteDocument", e),
            },
        })
    }

    /// Append a verification record to a profile's history
    async fn verify_profile(
        &self,
        ctx: &Context<'_>,
        input: VerifyProfileInput,
    ) -> GraphQLResult<VerificationResponse> {
        let new = input.into_new()?;
        info!(client_id = %caller(ctx), profile_id = %new.profile_id, "verifyProfile");

        Ok(match service(ctx)?.verify_profile(new).await {
            Ok(verification) => VerificationResponse {
                success: true,
                message: format!(
                    "Profile verification status set to {}",
                    verification.status.as_str()
                ),
                verification: Some(verification),
            },
            Err(e) => verification_failed(failure("verifyProfile", e)),
        })
    }

    async fn update_verification(
        &self,
        ctx: &Context<'_>,
        input: UpdateVerificationInput,
    ) -> GraphQLResult<VerificationResponse> {
        let (id, review) = input.into_review()?;
        info!(client_id = %caller(ctx), verification_id = %id, "updateVerification");

        Ok(match service(ctx)?.update_verification(id, review).await {
            Ok(Some(verification)) => VerificationResponse {
                success: true,
                message: "Verification updated successfully".to_string(),
                verification: Some(verification),
            },
            Ok(None) => verification_failed("Verification not found".to_string()),
            Err(e) => verification_failed(failure("updateVerification", e)),
        })
    }
}
