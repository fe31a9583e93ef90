/// Project model and database operations
///
/// A Project belongs to exactly one Organization; the organization reference
/// is immutable after creation. Deleting a project removes its member and
/// task records in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     description TEXT,
///     organization_id UUID NOT NULL REFERENCES organizations(id),
///     status TEXT NOT NULL DEFAULT 'active',
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT projects_status_check CHECK (
///         status IN ('active', 'completed', 'on-hold', 'cancelled')
///     )
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    /// Work is ongoing (default)
    Active,

    /// Work has finished
    Completed,

    /// Work is paused
    OnHold,

    /// Work was abandoned
    Cancelled,
}

impl ProjectStatus {
    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Owning organization (immutable after creation)
    pub organization_id: Uuid,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// User who created the project
    pub created_by: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Compact project projection embedded in member views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,
}

impl Project {
    /// Creates a new project in an organization
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, organization_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, organization_id, status, created_by, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(organization_id)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, organization_id, status, created_by, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all projects of an organization
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, organization_id, status, created_by, created_at, updated_at
            FROM projects
            WHERE organization_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Updates name and/or description
    ///
    /// Fields left `None` are unchanged.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, organization_id, status, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project together with its scoped member and task records
    ///
    /// The three deletes run in one transaction so a failure cannot leave
    /// orphaned member records behind.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails; nothing is removed in that case.
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM members WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    /// Returns the compact projection used in responses
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ProjectStatus::Active.as_str(), "active");
        assert_eq!(ProjectStatus::Completed.as_str(), "completed");
        assert_eq!(ProjectStatus::OnHold.as_str(), "on-hold");
        assert_eq!(ProjectStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_serde_wire_format() {
        let json = serde_json::to_string(&ProjectStatus::OnHold).unwrap();
        assert_eq!(json, "\"on-hold\"");

        let parsed: ProjectStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, ProjectStatus::Cancelled);
    }
}
