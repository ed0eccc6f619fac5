//! Profile queries

use async_graphql::{Context, Object, Result as GraphQLResult, ID};

use super::inputs::{parse_id, PaginationInput, ProfileFilterInput};
use super::service_error;
use super::types::{ProfileListResponse, ProfileUnion, ProfileDocumentType, ProfileVerificationType};
use crate::db::{PageRequest, ProfileFilter};
use crate::services::ProfileService;

fn service<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a ProfileService> {
    ctx.data::<ProfileService>()
        .map_err(|_| "Profile service not available".into())
}

#[derive(Default)]
pub struct ProfileQuery;

#[Object]
impl ProfileQuery {
    async fn profile(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<Option<ProfileUnion>> {
        let id = parse_id(&id, "id")?;
        service(ctx)?
            .get_profile(id)
            .await
            .map_err(|e| service_error("profile", e))
    }

    async fn profile_by_user(
        &self,
        ctx: &Context<'_>,
        external_user_id: ID,
    ) -> GraphQLResult<Option<ProfileUnion>> {
        let external_user_id = parse_id(&external_user_id, "externalUserId")?;
        service(ctx)?
            .get_profile_by_user(external_user_id)
            .await
            .map_err(|e| service_error("profileByUser", e))
    }

    async fn profiles(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProfileFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> GraphQLResult<ProfileListResponse> {
        let filter: ProfileFilter = filter.map(Into::into).unwrap_or_default();
        let page: PageRequest = pagination.map(Into::into).unwrap_or_default();
        service(ctx)?
            .list_profiles(&filter, page)
            .await
            .map_err(|e| service_error("profiles", e))
    }

    async fn profile_documents(
        &self,
        ctx: &Context<'_>,
        profile_id: ID,
    ) -> GraphQLResult<Vec<ProfileDocumentType>> {
        let profile_id = parse_id(&profile_id, "profileId")?;
        service(ctx)?
            .get_profile_documents(profile_id)
            .await
            .map_err(|e| service_error("profileDocuments", e))
    }

    async fn profile_verifications(
        &self,
        ctx: &Context<'_>,
        profile_id: ID,
    ) -> GraphQLResult<Vec<ProfileVerificationType>> {
        let profile_id = parse_id(&profile_id, "profileId")?;
        service(ctx)?
            .get_profile_verifications(profile_id)
            .await
            .map_err(|e| service_error("profileVerifications", e))
    }

    async fn latest_verification(
        &self,
        ctx: &Context<'_>,
        profile_id: ID,
    ) -> GraphQLResult<Option<ProfileVerificationType>> {
        let profile_id = parse_id(&profile_id, "profileId")?;
        service(ctx)?
            .get_latest_verification(profile_id)
            .await
            .map_err(|e| service_error("latestVerification", e))
    }
}
