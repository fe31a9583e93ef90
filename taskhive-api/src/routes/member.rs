/// Member endpoints
///
/// Members join users to an (organization, project) scope with a role.
/// Adding a member by email creates a placeholder user when the address has
/// never signed in; the placeholder is claimed at first authentication.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::{middleware::AuthContext, policy};
use taskhive_shared::models::member::{
    aggregate_organization_members, AggregatedMember, CreateMember, Member, MemberRole, MemberView,
};
use taskhive_shared::models::organization::Organization;
use taskhive_shared::models::project::Project;
use taskhive_shared::models::user::User;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Request body for POST /member/add/:organizationId/:projectId
///
/// `role` arrives as a plain string so unknown values produce a 400 instead
/// of a body-deserialization rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of the person to add
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role to assign: owner, member, or viewer
    pub role: String,
}

/// POST /member/add/:organizationId/:projectId
///
/// Adds a user to a project by email, creating a placeholder user when the
/// email is unknown. Organization owner or project creator only.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path((_organization_id, project_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MemberView>>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let role = MemberRole::parse(&body.role)
        .ok_or_else(|| ApiError::BadRequest("Invalid role".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    // The organization is resolved through the project; a mismatched
    // organizationId in the URL is ignored.
    let organization = Organization::find_by_id(&state.db, project.organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let actor = context.user.clone();

    if !policy::can_manage_project(&organization, &project, actor.id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to add members to this project".to_string(),
        ));
    }

    let user = match User::find_by_email(&state.db, &body.email).await? {
        Some(user) => user,
        None => User::create_placeholder(&state.db, &body.email).await?,
    };

    if Member::find_active(&state.db, organization.id, user.id, Some(project.id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    let member = Member::create(
        &state.db,
        CreateMember {
            user_id: user.id,
            organization_id: organization.id,
            project_id: Some(project.id),
            role,
            added_by: Some(actor.id),
        },
    )
    .await?;

    info!(member_id = %member.id, project_id = %project.id, "Member added");

    let view = MemberView {
        id: member.id,
        user: user.summary(),
        role: member.role,
        status: member.status,
        added_by: Some(actor.summary()),
        added_at: member.added_at,
        organization_id: member.organization_id,
        project: Some(project.summary()),
    };

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Member added successfully", view),
    ))
}

/// GET /member/get/:organizationId/:projectId
///
/// Lists a project's active members with user, adder, and project populated.
/// Visible to the organization owner, the project creator, and active
/// project members.
pub async fn get_project_members(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path((organization_id, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<Vec<MemberView>>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let user_id = context.user_id();

    let allowed = policy::can_manage_project(&organization, &project, user_id)
        || Member::find_active(&state.db, organization.id, user_id, Some(project.id))
            .await?
            .is_some();

    if !allowed {
        return Err(ApiError::Forbidden(
            "You are not a member of this project".to_string(),
        ));
    }

    let members = Member::list_views_by_project(&state.db, organization.id, project.id).await?;

    Ok(ApiResponse::data(members))
}

/// GET /member/organization/:organizationId
///
/// Lists everyone in the organization collapsed to one record per user:
/// highest role across all memberships wins, and every project the user
/// belongs to is listed. Visible to the owner and any active member.
pub async fn get_organization_members(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<AggregatedMember>>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let user_id = context.user_id();

    let allowed = policy::is_org_owner(&organization, user_id)
        || Member::find_active_any(&state.db, organization.id, user_id)
            .await?
            .is_some();

    if !allowed {
        return Err(ApiError::Forbidden(
            "You are not a member of this organization".to_string(),
        ));
    }

    let rows = Member::list_views_by_organization(&state.db, organization.id).await?;
    let aggregated = aggregate_organization_members(rows);

    Ok(ApiResponse::data(aggregated))
}

/// Request body for PUT /member/update/:organizationId/:projectId/:memberId
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role: owner, member, or viewer
    pub role: Option<String>,

    /// New active flag
    pub status: Option<bool>,

    /// New display name, written to the shared user record
    pub name: Option<String>,

    /// New email, written to the shared user record
    pub email: Option<String>,
}

/// PUT /member/update/:organizationId/:projectId/:memberId
///
/// Updates a member's role/status. Name and email edits are written through
/// to the shared user record and are visible everywhere the user appears,
/// not just in this project. Organization owner or project creator only.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path((organization_id, project_id, member_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRequest>,
) -> ApiResult<Json<ApiResponse<MemberView>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !policy::can_manage_project(&organization, &project, context.user_id()) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update members of this project".to_string(),
        ));
    }

    let member = Member::find_by_id(&state.db, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    let role = match body.role.as_deref() {
        Some(value) => Some(
            MemberRole::parse(value)
                .ok_or_else(|| ApiError::BadRequest("Invalid role".to_string()))?,
        ),
        None => None,
    };

    if let Some(email) = body.email.as_deref() {
        if !email.validate_email() {
            return Err(ApiError::BadRequest("Invalid email format".to_string()));
        }
    }

    let updated = Member::update(&state.db, member.id, role, body.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    User::patch_profile(
        &state.db,
        updated.user_id,
        body.name.as_deref(),
        body.email.as_deref(),
    )
    .await?;

    let user = User::find_by_id(&state.db, updated.user_id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Member user record missing".to_string()))?;

    info!(member_id = %updated.id, "Member updated");

    let view = MemberView {
        id: updated.id,
        user: user.summary(),
        role: updated.role,
        status: updated.status,
        added_by: None,
        added_at: updated.added_at,
        organization_id: updated.organization_id,
        project: Some(project.summary()),
    };

    Ok(ApiResponse::message("Member updated successfully", view))
}

/// DELETE /member/delete/:organizationId/:projectId/:memberId
///
/// Removes a member record. Organization owner or project creator only, and
/// never an owner-role member or the actor's own record.
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path((organization_id, project_id, member_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<Member>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.organization_id != organization.id {
        return Err(ApiError::Forbidden(
            "Project does not belong to the organization".to_string(),
        ));
    }

    let member = Member::find_by_id(&state.db, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    if !policy::member_in_scope(&member, organization.id, project.id) {
        return Err(ApiError::BadRequest(
            "Member does not belong to this project".to_string(),
        ));
    }

    let actor_id = context.user_id();

    if !policy::can_manage_project(&organization, &project, actor_id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to remove members from this project".to_string(),
        ));
    }

    if let Some(denial) = policy::member_removal_denial(&member, actor_id) {
        return Err(ApiError::Forbidden(denial.message().to_string()));
    }

    Member::delete(&state.db, member.id).await?;

    info!(member_id = %member.id, project_id = %project.id, "Member removed");

    Ok(ApiResponse::message("Member removed successfully", member))
}
