/// Organization model and database operations
///
/// An Organization is the tenant boundary. Every organization is owned by
/// exactly one user, and a user may own at most one organization, a rule
/// enforced at creation time in application logic, not by the schema.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL UNIQUE,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     invitations JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

/// A pending invitation stored on the organization
///
/// The invitation workflow is not wired to any mail delivery; records are
/// carried on the organization document for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Invitee email address
    pub email: String,

    /// Opaque acceptance token
    pub token: String,

    /// User who issued the invitation
    pub invited_by: Uuid,

    /// When the invitation was issued
    pub invited_at: DateTime<Utc>,

    /// When the invitation expires
    pub expires_at: DateTime<Utc>,

    /// When the invitation was accepted, if ever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

/// Organization model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Organization ID
    pub id: Uuid,

    /// Organization name (globally unique)
    pub name: String,

    /// Owning user
    pub owner_id: Uuid,

    /// Pending invitations
    pub invitations: Json<Vec<Invitation>>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization
    ///
    /// Callers are responsible for the one-organization-per-owner and
    /// name-uniqueness checks before insert; the unique index on `name` is a
    /// backstop only.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn create(pool: &PgPool, name: &str, owner_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, invitations, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }

    /// Finds an organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_id, invitations, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the organization owned by a user, if any
    pub async fn find_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_id, invitations, created_at, updated_at
            FROM organizations
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds an organization by exact name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_id, invitations, created_at, updated_at
            FROM organizations
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Renames an organization
    ///
    /// # Errors
    ///
    /// Returns an error if the new name collides or the write fails.
    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, owner_id, invitations, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }
}
