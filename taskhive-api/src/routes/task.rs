/// Task endpoints
///
/// Tasks are created by project managers and worked on by assigned members.
/// The assignee list is fixed at creation time: either every active project
/// member, or an explicit subset that must resolve completely.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::{middleware::AuthContext, policy};
use taskhive_shared::models::member::Member;
use taskhive_shared::models::organization::Organization;
use taskhive_shared::models::project::Project;
use taskhive_shared::models::task::{resolve_assignees, CreateTask, Task, TaskStatus};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Request body for POST /task/create
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task name
    #[validate(length(min = 1, message = "Task name is required"))]
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Organization scope
    pub organization_id: Uuid,

    /// Project scope
    pub project_id: Uuid,

    /// Explicit assignee member ids; omitted means all active members
    pub member_ids: Option<Vec<Uuid>>,
}

/// POST /task/create
///
/// Creates a task in a project. Organization owner or project creator only.
/// A project with no active members cannot receive tasks.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(body): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let project = Project::find_by_id(&state.db, body.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let organization = Organization::find_by_id(&state.db, body.organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let user_id = context.user_id();

    if !policy::can_manage_project(&organization, &project, user_id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to create tasks in this project".to_string(),
        ));
    }

    let active_members =
        Member::list_active_by_project(&state.db, organization.id, project.id).await?;

    if active_members.is_empty() {
        return Err(ApiError::NotFound(
            "No members found for this project".to_string(),
        ));
    }

    let assigned_member_ids = resolve_assignees(body.member_ids.as_deref(), &active_members)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            name: body.name.trim().to_string(),
            description: body.description,
            created_by: user_id,
            organization_id: organization.id,
            project_id: project.id,
            assigned_member_ids,
        },
    )
    .await?;

    info!(task_id = %task.id, project_id = %project.id, "Task created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Task created successfully", task),
    ))
}

/// Request body for PUT /task/update-status/:taskId
///
/// `status` arrives as a plain string so unknown values produce a 400
/// instead of a body-deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    /// New status: todo, in-progress, or done
    pub status: String,
}

/// PUT /task/update-status/:taskId
///
/// Moves a task to a new status. Only active project members appearing in
/// the task's assignment list may do this; managers who are not assigned
/// cannot.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let status = TaskStatus::parse(&body.status)
        .ok_or_else(|| ApiError::BadRequest("Invalid status".to_string()))?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let member = Member::find_active(
        &state.db,
        task.organization_id,
        context.user_id(),
        Some(task.project_id),
    )
    .await?
    .ok_or_else(|| ApiError::Forbidden("You are not a member of this project".to_string()))?;

    if !task.is_assigned(member.id) {
        return Err(ApiError::Forbidden(
            "You are not assigned to this task".to_string(),
        ));
    }

    let updated = Task::update_status(&state.db, task.id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    info!(task_id = %updated.id, status = %status.as_str(), "Task status updated");

    Ok(ApiResponse::message("Task status updated successfully", updated))
}

/// GET /task/get/:organizationId/:projectId
///
/// Lists a project's tasks.
pub async fn get_project_tasks(
    State(state): State<AppState>,
    Extension(_context): Extension<AuthContext>,
    Path((organization_id, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let organization = Organization::find_by_id(&state.db, organization_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::list_by_project(&state.db, organization.id, project.id).await?;

    Ok(ApiResponse::data(tasks))
}

/// DELETE /task/delete/:taskId
///
/// Deletes a task. Any authenticated user can delete any task by id; no
/// membership or role check is performed here.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(_context): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Task::delete(&state.db, task.id).await?;

    info!(task_id = %task.id, "Task deleted");

    Ok(ApiResponse::message("Task deleted successfully", task))
}
