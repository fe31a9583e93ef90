/// Member model, role order, and the organization-wide membership rollup
///
/// A Member is the role-assignment join entity linking a user to an
/// organization and, usually, to a project. A `NULL` project denotes an
/// organization-level membership, the record every organization owner gets
/// at creation time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     organization_id UUID NOT NULL REFERENCES organizations(id),
///     project_id UUID REFERENCES projects(id),
///     role TEXT NOT NULL,
///     status BOOLEAN NOT NULL DEFAULT TRUE,
///     added_by UUID REFERENCES users(id),
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT members_role_check CHECK (role IN ('owner', 'member', 'viewer'))
/// );
/// ```
///
/// # Invariants
///
/// - When `project_id` is set, the project's organization must equal the
///   member's organization. `Member::create` validates this before insert;
///   a violation fails the write.
/// - Duplicate active `(organization, user, project)` combinations are
///   rejected by callers via [`Member::find_active`] before insert; the
///   schema does not enforce this.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::project::ProjectSummary;
use super::user::UserSummary;

/// Roles a member can hold within a project or organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Full control within the scope
    Owner,

    /// Can work on tasks
    Member,

    /// Read-only access
    Viewer,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
            MemberRole::Viewer => "viewer",
        }
    }

    /// Parses a role from its wire representation
    ///
    /// Returns `None` for anything outside {owner, member, viewer}; callers
    /// turn that into a 400 rather than letting the body deserializer reject
    /// the whole request.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(MemberRole::Owner),
            "member" => Some(MemberRole::Member),
            "viewer" => Some(MemberRole::Viewer),
            _ => None,
        }
    }

    /// Numeric rank used for the highest-role-wins rollup
    ///
    /// Total order: owner (3) > member (2) > viewer (1).
    pub fn rank(&self) -> u8 {
        match self {
            MemberRole::Owner => 3,
            MemberRole::Member => 2,
            MemberRole::Viewer => 1,
        }
    }
}

/// Error type for member writes
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    /// The member's project belongs to a different organization
    #[error("Project does not belong to the organization")]
    ProjectScopeMismatch,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Input for creating a new member
#[derive(Debug, Clone)]
pub struct CreateMember {
    /// User being granted the role
    pub user_id: Uuid,

    /// Organization scope
    pub organization_id: Uuid,

    /// Project scope (None for organization-level records)
    pub project_id: Option<Uuid>,

    /// Role to assign
    pub role: MemberRole,

    /// User who added this member (None for owner records created with the
    /// organization)
    pub added_by: Option<Uuid>,
}

/// Member model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    /// Member record ID
    pub id: Uuid,

    /// User reference
    pub user_id: Uuid,

    /// Organization reference
    pub organization_id: Uuid,

    /// Project reference (None denotes organization-level membership)
    pub project_id: Option<Uuid>,

    /// Assigned role
    pub role: MemberRole,

    /// Active flag
    pub status: bool,

    /// User who added this member
    pub added_by: Option<Uuid>,

    /// When the member was added
    pub added_at: DateTime<Utc>,
}

/// A member row joined with its user, adder, and project
///
/// This is the populated shape the member endpoints return, and the input to
/// [`aggregate_organization_members`].
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    /// Member record ID
    pub id: Uuid,

    /// The user holding the role
    pub user: UserSummary,

    /// Assigned role
    pub role: MemberRole,

    /// Active flag
    pub status: bool,

    /// Who added this member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<UserSummary>,

    /// When the member was added
    pub added_at: DateTime<Utc>,

    /// Organization scope
    pub organization_id: Uuid,

    /// Project scope, when the record is project-level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

/// Per-user rollup of memberships across an organization's projects
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedMember {
    /// Member record ID of the first-seen record for this user
    pub id: Uuid,

    /// The user
    pub user: UserSummary,

    /// Highest role held across all memberships (owner > member > viewer)
    pub role: MemberRole,

    /// Active flag of the first-seen record
    pub status: bool,

    /// Adder of the first-seen record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<UserSummary>,

    /// Added-at of the first-seen record
    pub added_at: DateTime<Utc>,

    /// Organization scope
    pub organization_id: Uuid,

    /// Every project the user holds a membership in
    pub projects: Vec<ProjectSummary>,
}

/// Flat row shape for the joined member queries
#[derive(Debug, sqlx::FromRow)]
struct MemberJoinRow {
    id: Uuid,
    user_id: Uuid,
    organization_id: Uuid,
    role: MemberRole,
    status: bool,
    added_at: DateTime<Utc>,
    user_name: Option<String>,
    user_email: String,
    user_avatar: Option<String>,
    added_by_id: Option<Uuid>,
    added_by_name: Option<String>,
    added_by_email: Option<String>,
    project_id: Option<Uuid>,
    project_name: Option<String>,
}

impl From<MemberJoinRow> for MemberView {
    fn from(row: MemberJoinRow) -> Self {
        let added_by = match (row.added_by_id, row.added_by_email) {
            (Some(id), Some(email)) => Some(UserSummary {
                id,
                name: row.added_by_name,
                email,
                avatar: None,
            }),
            _ => None,
        };

        let project = match (row.project_id, row.project_name) {
            (Some(id), Some(name)) => Some(ProjectSummary { id, name }),
            _ => None,
        };

        MemberView {
            id: row.id,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                avatar: row.user_avatar,
            },
            role: row.role,
            status: row.status,
            added_by,
            added_at: row.added_at,
            organization_id: row.organization_id,
            project,
        }
    }
}

impl Member {
    /// Creates a new member record
    ///
    /// When the member is project-scoped, the project's organization is
    /// checked against the member's organization before the insert; a
    /// mismatch fails the whole write with
    /// [`MemberError::ProjectScopeMismatch`].
    ///
    /// # Errors
    ///
    /// Returns an error on scope violation or database failure.
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, MemberError> {
        if let Some(project_id) = data.project_id {
            let project_org: Option<Uuid> =
                sqlx::query_scalar("SELECT organization_id FROM projects WHERE id = $1")
                    .bind(project_id)
                    .fetch_optional(pool)
                    .await?;

            if project_org != Some(data.organization_id) {
                return Err(MemberError::ProjectScopeMismatch);
            }
        }

        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (user_id, organization_id, project_id, role, status, added_by)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING id, user_id, organization_id, project_id, role, status, added_by, added_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.organization_id)
        .bind(data.project_id)
        .bind(data.role)
        .bind(data.added_by)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Finds a member record by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, user_id, organization_id, project_id, role, status, added_by, added_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds an active membership for a user in an exact (organization, project) scope
    ///
    /// Pass `Some(project_id)` for a project-scoped lookup; `None` matches
    /// only the organization-level record.
    pub async fn find_active(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, user_id, organization_id, project_id, role, status, added_by, added_at
            FROM members
            WHERE organization_id = $1
              AND user_id = $2
              AND project_id IS NOT DISTINCT FROM $3
              AND status = TRUE
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds any active membership of a user in an organization, project-level or not
    pub async fn find_active_any(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, user_id, organization_id, project_id, role, status, added_by, added_at
            FROM members
            WHERE organization_id = $1 AND user_id = $2 AND status = TRUE
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds any active membership of a user across all organizations
    ///
    /// Used by `GET /organization/current` to fall back to the organization
    /// of any active membership when the user owns none.
    pub async fn find_any_active_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, user_id, organization_id, project_id, role, status, added_by, added_at
            FROM members
            WHERE user_id = $1 AND status = TRUE
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists active members of a project (raw rows, no joins)
    pub async fn list_active_by_project(
        pool: &PgPool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, user_id, organization_id, project_id, role, status, added_by, added_at
            FROM members
            WHERE organization_id = $1 AND project_id = $2 AND status = TRUE
            ORDER BY added_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Lists active members of a project with user/adder/project populated
    pub async fn list_views_by_project(
        pool: &PgPool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberJoinRow>(
            r#"
            SELECT m.id, m.user_id, m.organization_id, m.role, m.status, m.added_at,
                   u.name AS user_name, u.email AS user_email, u.avatar AS user_avatar,
                   a.id AS added_by_id, a.name AS added_by_name, a.email AS added_by_email,
                   p.id AS project_id, p.name AS project_name
            FROM members m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN users a ON a.id = m.added_by
            LEFT JOIN projects p ON p.id = m.project_id
            WHERE m.organization_id = $1 AND m.project_id = $2 AND m.status = TRUE
            ORDER BY m.added_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MemberView::from).collect())
    }

    /// Lists all active members of an organization across every project,
    /// including the organization-level owner record
    pub async fn list_views_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberJoinRow>(
            r#"
            SELECT m.id, m.user_id, m.organization_id, m.role, m.status, m.added_at,
                   u.name AS user_name, u.email AS user_email, u.avatar AS user_avatar,
                   a.id AS added_by_id, a.name AS added_by_name, a.email AS added_by_email,
                   p.id AS project_id, p.name AS project_name
            FROM members m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN users a ON a.id = m.added_by
            LEFT JOIN projects p ON p.id = m.project_id
            WHERE m.organization_id = $1 AND m.status = TRUE
            ORDER BY m.added_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MemberView::from).collect())
    }

    /// Updates role and/or status
    ///
    /// Fields left `None` are unchanged.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        role: Option<MemberRole>,
        status: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET role = COALESCE($2, role), status = COALESCE($3, status)
            WHERE id = $1
            RETURNING id, user_id, organization_id, project_id, role, status, added_by, added_at
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Hard-deletes a member record
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Collapses an organization's active member rows into one record per user
///
/// Rows are grouped by user id in input order. The first-seen row supplies
/// the aggregate's id, status, adder, and added-at; every row with a project
/// appends that project to the aggregate's project list; the role is
/// replaced only when a later row's rank strictly exceeds the current one.
///
/// First-seen-wins for the identity fields means the retained member id
/// depends on row order; current behavior, kept as-is.
pub fn aggregate_organization_members(rows: Vec<MemberView>) -> Vec<AggregatedMember> {
    let mut aggregates: Vec<AggregatedMember> = Vec::new();
    let mut index_by_user: HashMap<Uuid, usize> = HashMap::new();

    for row in rows {
        let idx = match index_by_user.get(&row.user.id) {
            Some(&idx) => idx,
            None => {
                index_by_user.insert(row.user.id, aggregates.len());
                aggregates.push(AggregatedMember {
                    id: row.id,
                    user: row.user.clone(),
                    role: row.role,
                    status: row.status,
                    added_by: row.added_by.clone(),
                    added_at: row.added_at,
                    organization_id: row.organization_id,
                    projects: Vec::new(),
                });
                aggregates.len() - 1
            }
        };

        let aggregate = &mut aggregates[idx];

        if let Some(project) = row.project {
            aggregate.projects.push(project);
        }

        if row.role.rank() > aggregate.role.rank() {
            aggregate.role = row.role;
        }
    }

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(
        user_id: Uuid,
        role: MemberRole,
        project: Option<(Uuid, &str)>,
    ) -> MemberView {
        MemberView {
            id: Uuid::new_v4(),
            user: UserSummary {
                id: user_id,
                name: Some("someone".to_string()),
                email: format!("{}@example.com", user_id.simple()),
                avatar: None,
            },
            role,
            status: true,
            added_by: None,
            added_at: Utc::now(),
            organization_id: Uuid::new_v4(),
            project: project.map(|(id, name)| ProjectSummary {
                id,
                name: name.to_string(),
            }),
        }
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert_eq!(MemberRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(MemberRole::parse("owner"), Some(MemberRole::Owner));
        assert_eq!(MemberRole::parse("member"), Some(MemberRole::Member));
        assert_eq!(MemberRole::parse("viewer"), Some(MemberRole::Viewer));
        assert_eq!(MemberRole::parse("admin"), None);
        assert_eq!(MemberRole::parse("Owner"), None);
    }

    #[test]
    fn test_role_rank_order() {
        assert!(MemberRole::Owner.rank() > MemberRole::Member.rank());
        assert!(MemberRole::Member.rank() > MemberRole::Viewer.rank());
    }

    #[test]
    fn test_aggregate_highest_role_wins() {
        let user = Uuid::new_v4();
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();

        let rows = vec![
            view(user, MemberRole::Viewer, Some((project_a, "alpha"))),
            view(user, MemberRole::Owner, Some((project_b, "beta"))),
        ];

        let aggregated = aggregate_organization_members(rows);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].role, MemberRole::Owner);
        assert_eq!(aggregated[0].projects.len(), 2);
        assert_eq!(aggregated[0].projects[0].id, project_a);
        assert_eq!(aggregated[0].projects[1].id, project_b);
    }

    #[test]
    fn test_aggregate_lower_role_does_not_downgrade() {
        let user = Uuid::new_v4();
        let rows = vec![
            view(user, MemberRole::Owner, Some((Uuid::new_v4(), "alpha"))),
            view(user, MemberRole::Viewer, Some((Uuid::new_v4(), "beta"))),
        ];

        let aggregated = aggregate_organization_members(rows);
        assert_eq!(aggregated[0].role, MemberRole::Owner);
    }

    #[test]
    fn test_aggregate_first_seen_identity_retained() {
        let user = Uuid::new_v4();
        let first = view(user, MemberRole::Viewer, Some((Uuid::new_v4(), "alpha")));
        let first_id = first.id;
        let second = view(user, MemberRole::Owner, Some((Uuid::new_v4(), "beta")));

        let aggregated = aggregate_organization_members(vec![first, second]);
        assert_eq!(aggregated[0].id, first_id);
    }

    #[test]
    fn test_aggregate_org_level_record_has_no_project() {
        let owner = Uuid::new_v4();
        let rows = vec![view(owner, MemberRole::Owner, None)];

        let aggregated = aggregate_organization_members(rows);
        assert_eq!(aggregated.len(), 1);
        assert!(aggregated[0].projects.is_empty());
    }

    #[test]
    fn test_aggregate_preserves_first_appearance_order() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let rows = vec![
            view(alice, MemberRole::Viewer, Some((Uuid::new_v4(), "alpha"))),
            view(bob, MemberRole::Member, Some((Uuid::new_v4(), "alpha"))),
            view(alice, MemberRole::Member, Some((Uuid::new_v4(), "beta"))),
        ];

        let aggregated = aggregate_organization_members(rows);
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0].user.id, alice);
        assert_eq!(aggregated[1].user.id, bob);
        assert_eq!(aggregated[0].role, MemberRole::Member);
    }
}
