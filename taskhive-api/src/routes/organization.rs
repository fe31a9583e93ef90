/// Organization endpoints
///
/// An organization is the tenant boundary. Each user may own at most one;
/// the rule is enforced here at creation time rather than by the schema.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::{middleware::AuthContext, policy};
use taskhive_shared::models::member::{CreateMember, Member, MemberRole};
use taskhive_shared::models::organization::Organization;
use taskhive_shared::models::user::User;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Request body for POST /organization/create
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    /// Organization name (globally unique)
    #[validate(length(min = 1, message = "Organization name is required"))]
    pub name: String,
}

/// POST /organization/create
///
/// Creates an organization owned by the acting user, together with the
/// owner's organization-level member record.
///
/// The organization insert and the member insert are separate writes, not a
/// transaction. A crash between the two leaves an organization whose owner
/// has no member record.
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(body): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Organization>>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest(
            "Organization name is required".to_string(),
        ));
    }

    let user_id = context.user_id();

    if Organization::find_by_owner(&state.db, user_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "You already have an organization. Each user can only have one organization."
                .to_string(),
        ));
    }

    if Organization::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict(
            "Organization with this name already exists".to_string(),
        ));
    }

    let organization = Organization::create(&state.db, name, user_id).await?;

    Member::create(
        &state.db,
        CreateMember {
            user_id,
            organization_id: organization.id,
            project_id: None,
            role: MemberRole::Owner,
            added_by: None,
        },
    )
    .await?;

    User::push_organization(&state.db, user_id, organization.id).await?;

    info!(organization_id = %organization.id, owner_id = %user_id, "Organization created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Organization created successfully", organization),
    ))
}

/// GET /organization/current
///
/// Returns the organization the acting user belongs to: the one they own
/// when they own one, otherwise the organization of any active membership.
pub async fn current_organization(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Organization>>> {
    let user_id = context.user_id();

    if let Some(organization) = Organization::find_by_owner(&state.db, user_id).await? {
        return Ok(ApiResponse::data(organization));
    }

    if let Some(membership) = Member::find_any_active_for_user(&state.db, user_id).await? {
        if let Some(organization) =
            Organization::find_by_id(&state.db, membership.organization_id).await?
        {
            return Ok(ApiResponse::data(organization));
        }
    }

    Err(ApiError::NotFound("No organization found".to_string()))
}

/// Request body for PUT /organization/update/:organizationId
#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    /// New organization name
    pub name: Option<String>,
}

/// PUT /organization/update/:organizationId
///
/// Renames an organization. Owner only.
pub async fn update_organization(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> ApiResult<Json<ApiResponse<Organization>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    if !policy::is_org_owner(&organization, context.user_id()) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update this organization".to_string(),
        ));
    }

    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(ApiResponse::data(organization)),
    };

    if let Some(existing) = Organization::find_by_name(&state.db, name).await? {
        if existing.id != organization.id {
            return Err(ApiError::Conflict(
                "Organization with this name already exists".to_string(),
            ));
        }
    }

    let updated = Organization::rename(&state.db, organization.id, name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(ApiResponse::message(
        "Organization updated successfully",
        updated,
    ))
}
