/// Task model and assignment rules
///
/// A Task belongs to one project and organization and carries an ordered list
/// of assigned member ids. The list is captured at creation time and is not
/// retroactively changed by later membership edits.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     description TEXT,
///     created_by UUID NOT NULL REFERENCES users(id),
///     organization_id UUID NOT NULL REFERENCES organizations(id),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     assigned_member_ids UUID[] NOT NULL DEFAULT '{}',
///     status TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Status
///
/// `status` is nullable on purpose: tasks created before any status change
/// have no stored value, and readers treat the absence as `todo` via
/// [`Task::effective_status`] without ever writing the default back. The
/// three states form an unordered set: any assigned member may move a task
/// to any state at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::member::Member;

/// Tri-state task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    /// Parses a status from its wire representation
    ///
    /// Returns `None` for anything outside {todo, in-progress, done}.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(TaskStatus::Todo),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// Error type for task assignment resolution
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// One or more requested member ids do not resolve to an active member
    /// of the target project
    #[error("Some member IDs are invalid or don't belong to this project")]
    InvalidMemberSubset,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Task name
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Creating user
    pub created_by: Uuid,

    /// Organization scope
    pub organization_id: Uuid,

    /// Project scope
    pub project_id: Uuid,

    /// Resolved assignee member ids (see [`resolve_assignees`])
    pub assigned_member_ids: Vec<Uuid>,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Task ID
    pub id: Uuid,

    /// Task name
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Creating user
    pub created_by: Uuid,

    /// Organization scope
    pub organization_id: Uuid,

    /// Project scope
    pub project_id: Uuid,

    /// Member ids captured at creation time
    pub assigned_member_ids: Vec<Uuid>,

    /// Stored status; absent until first explicitly set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (name, description, created_by, organization_id, project_id, assigned_member_ids)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, created_by, organization_id, project_id,
                      assigned_member_ids, status, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .bind(data.organization_id)
        .bind(data.project_id)
        .bind(&data.assigned_member_ids)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, created_by, organization_id, project_id,
                   assigned_member_ids, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all tasks of a project
    pub async fn list_by_project(
        pool: &PgPool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, created_by, organization_id, project_id,
                   assigned_member_ids, status, created_at, updated_at
            FROM tasks
            WHERE organization_id = $1 AND project_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Sets the task status
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_by, organization_id, project_id,
                      assigned_member_ids, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Hard-deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The status readers should act on: stored value, or `todo` when unset
    pub fn effective_status(&self) -> TaskStatus {
        self.status.unwrap_or(TaskStatus::Todo)
    }

    /// Whether a member record id appears in the task's assignment list
    pub fn is_assigned(&self, member_id: Uuid) -> bool {
        self.assigned_member_ids.contains(&member_id)
    }
}

/// Resolves the assignee list for a new task
///
/// With an explicit subset, every requested id must resolve to an active
/// member of the target project; any unresolvable id fails the whole
/// operation, never a partial assignment. Without a subset, all
/// currently active project members are assigned.
///
/// # Errors
///
/// Returns [`AssignmentError::InvalidMemberSubset`] when a requested id is
/// not among the project's active members.
pub fn resolve_assignees(
    requested: Option<&[Uuid]>,
    active_members: &[Member],
) -> Result<Vec<Uuid>, AssignmentError> {
    match requested {
        Some(ids) if !ids.is_empty() => {
            for id in ids {
                if !active_members.iter().any(|m| m.id == *id) {
                    return Err(AssignmentError::InvalidMemberSubset);
                }
            }
            Ok(ids.to_vec())
        }
        _ => Ok(active_members.iter().map(|m| m.id).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::MemberRole;

    fn member(id: Uuid) -> Member {
        Member {
            id,
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            role: MemberRole::Member,
            status: true,
            added_by: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TaskStatus::parse("todo"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("done"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("doing"), None);
        assert_eq!(TaskStatus::parse("in_progress"), None);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_resolve_assignees_defaults_to_all_active() {
        let members: Vec<Member> = (0..3).map(|_| member(Uuid::new_v4())).collect();
        let expected: Vec<Uuid> = members.iter().map(|m| m.id).collect();

        let resolved = resolve_assignees(None, &members).unwrap();
        assert_eq!(resolved, expected);

        // An explicit empty list behaves like no list at all.
        let resolved = resolve_assignees(Some(&[]), &members).unwrap();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_resolve_assignees_explicit_subset() {
        let members: Vec<Member> = (0..3).map(|_| member(Uuid::new_v4())).collect();
        let subset = vec![members[1].id];

        let resolved = resolve_assignees(Some(&subset), &members).unwrap();
        assert_eq!(resolved, subset);
    }

    #[test]
    fn test_resolve_assignees_rejects_foreign_id() {
        let members: Vec<Member> = (0..2).map(|_| member(Uuid::new_v4())).collect();
        let subset = vec![members[0].id, Uuid::new_v4()];

        let result = resolve_assignees(Some(&subset), &members);
        assert!(matches!(result, Err(AssignmentError::InvalidMemberSubset)));
    }

    #[test]
    fn test_effective_status_defaults_to_todo() {
        let task = Task {
            id: Uuid::new_v4(),
            name: "spec review".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            assigned_member_ids: vec![],
            status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(task.effective_status(), TaskStatus::Todo);
    }

    #[test]
    fn test_is_assigned() {
        let member_id = Uuid::new_v4();
        let task = Task {
            id: Uuid::new_v4(),
            name: "spec review".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            assigned_member_ids: vec![member_id],
            status: Some(TaskStatus::Todo),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(task.is_assigned(member_id));
        assert!(!task.is_assigned(Uuid::new_v4()));
    }
}
