/// Project endpoints
///
/// Projects live inside an organization. Creation is restricted to the
/// organization owner; updates and deletes are open to the owner or the
/// project's creator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::{middleware::AuthContext, policy};
use taskhive_shared::models::member::{CreateMember, Member, MemberRole};
use taskhive_shared::models::organization::Organization;
use taskhive_shared::models::project::Project;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Request body for POST /project/create
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, message = "Project name is required"))]
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Owning organization
    pub organization_id: Uuid,
}

/// POST /project/create
///
/// Creates a project and the creator's project-scoped owner member record.
/// The two inserts are separate writes, matching organization creation.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(body): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Project>>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let organization = Organization::find_by_id(&state.db, body.organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let user_id = context.user_id();

    if !policy::is_org_owner(&organization, user_id) {
        return Err(ApiError::Forbidden(
            "Only the organization owner can create projects".to_string(),
        ));
    }

    let project = Project::create(
        &state.db,
        body.name.trim(),
        body.description.as_deref(),
        organization.id,
        user_id,
    )
    .await?;

    Member::create(
        &state.db,
        CreateMember {
            user_id,
            organization_id: organization.id,
            project_id: Some(project.id),
            role: MemberRole::Owner,
            added_by: Some(user_id),
        },
    )
    .await?;

    info!(project_id = %project.id, organization_id = %organization.id, "Project created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Project created successfully", project),
    ))
}

/// GET /project/get/:organizationId
///
/// Lists the organization's projects. Visible to the owner and to any user
/// holding an active membership in the organization.
pub async fn get_projects(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Project>>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let user_id = context.user_id();

    let is_member = policy::is_org_owner(&organization, user_id)
        || Member::find_active_any(&state.db, organization.id, user_id)
            .await?
            .is_some();

    if !is_member {
        return Err(ApiError::Forbidden(
            "You are not a member of this organization".to_string(),
        ));
    }

    let projects = Project::list_by_organization(&state.db, organization.id).await?;

    Ok(ApiResponse::data(projects))
}

/// Request body for PUT /project/update/:projectId
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    /// New project name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,
}

/// PUT /project/update/:projectId
///
/// Updates name/description. Organization owner or project creator only.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let organization = Organization::find_by_id(&state.db, project.organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    if !policy::can_manage_project(&organization, &project, context.user_id()) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update this project".to_string(),
        ));
    }

    let name = body.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let updated = Project::update(&state.db, project.id, name, body.description.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(ApiResponse::message("Project updated successfully", updated))
}

/// DELETE /project/delete/:projectId
///
/// Deletes a project together with its member and task records in one
/// transaction. Organization owner or project creator only.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let organization = Organization::find_by_id(&state.db, project.organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    if !policy::can_manage_project(&organization, &project, context.user_id()) {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this project".to_string(),
        ));
    }

    Project::delete_cascade(&state.db, project.id).await?;

    info!(project_id = %project.id, "Project deleted");

    Ok(ApiResponse::message("Project deleted successfully", project))
}
