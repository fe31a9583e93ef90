/// User model and database operations
///
/// A User is an identity record. It is created in one of two ways:
///
/// 1. On first verification of an external identity assertion, carrying the
///    provider's stable subject id (`external_uid`).
/// 2. As a placeholder when someone is added to a project by email before
///    they have ever signed in. The placeholder has no `external_uid` and is
///    "claimed" later when the person authenticates with the same email.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     external_uid TEXT,
///     email TEXT NOT NULL UNIQUE,
///     name TEXT,
///     avatar TEXT,
///     organization_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::identity::IdentityAssertion;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Internal user ID
    pub id: Uuid,

    /// Identity-provider subject id (None for unclaimed placeholders)
    pub external_uid: Option<String>,

    /// Email address (globally unique)
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Avatar URL
    pub avatar: Option<String>,

    /// Organizations this user owns
    pub organization_ids: Vec<Uuid>,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Compact user projection embedded in member views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: Option<String>,

    /// Email address
    pub email: String,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Resolves a verified identity assertion to a user record
    ///
    /// Looks the user up by the provider's subject id. If found, the email is
    /// refreshed, name and avatar are updated only when the assertion carries
    /// them, and `updated_at` is bumped.
    ///
    /// When the subject id is unknown, an unclaimed placeholder with the
    /// assertion's email is claimed: the placeholder row gets the subject id
    /// (and name/avatar when the assertion carries them), so memberships
    /// granted before first sign-in keep pointing at the same user. Only when
    /// neither lookup matches is a new user created, with the name defaulting
    /// to the email's local part.
    ///
    /// Exactly one write is performed per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails (including a unique
    /// violation when the assertion email belongs to an account already
    /// claimed by a different subject id).
    pub async fn resolve_from_assertion(
        pool: &PgPool,
        assertion: &IdentityAssertion,
    ) -> Result<Self, sqlx::Error> {
        if let Some(existing) = Self::find_by_external_uid(pool, &assertion.subject).await? {
            let name = assertion.name.clone().or(existing.name);
            let avatar = assertion.avatar.clone().or(existing.avatar);

            let user = sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET email = $2, name = $3, avatar = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
                "#,
            )
            .bind(existing.id)
            .bind(&assertion.email)
            .bind(name)
            .bind(avatar)
            .fetch_one(pool)
            .await?;

            return Ok(user);
        }

        if let Some(placeholder) = Self::find_by_email(pool, &assertion.email).await? {
            // Rows already claimed by another subject id fall through to the
            // insert, which fails on the email unique constraint.
            if placeholder.external_uid.is_none() {
                let name = assertion.name.clone().or(placeholder.name);
                let avatar = assertion.avatar.clone().or(placeholder.avatar);

                let user = sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET external_uid = $2, name = $3, avatar = $4, updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
                    "#,
                )
                .bind(placeholder.id)
                .bind(&assertion.subject)
                .bind(name)
                .bind(avatar)
                .fetch_one(pool)
                .await?;

                return Ok(user);
            }
        }

        let name = assertion
            .name
            .clone()
            .unwrap_or_else(|| local_part(&assertion.email).to_string());

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_uid, email, name, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
            "#,
        )
        .bind(&assertion.subject)
        .bind(&assertion.email)
        .bind(name)
        .bind(&assertion.avatar)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates a placeholder user for an email that has never signed in
    ///
    /// The display name defaults to the email's local part. The record has no
    /// `external_uid` until the person authenticates.
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the write fails.
    pub async fn create_placeholder(pool: &PgPool, email: &str) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            RETURNING id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(local_part(email))
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by internal ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by the identity provider's subject id
    pub async fn find_by_external_uid(
        pool: &PgPool,
        external_uid: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_uid, email, name, avatar, organization_ids, created_at, updated_at
            FROM users
            WHERE external_uid = $1
            "#,
        )
        .bind(external_uid)
        .fetch_optional(pool)
        .await
    }

    /// Records an owned organization on the user
    pub async fn push_organization(
        pool: &PgPool,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET organization_ids = array_append(organization_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Patches global name/email on the user
    ///
    /// Used by the member-update endpoint, which edits shared identity data
    /// as a side effect of a project-scoped member update. Fields left `None`
    /// are unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the new email collides with another account or the
    /// write fails.
    pub async fn patch_profile(
        pool: &PgPool,
        user_id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        if name.is_none() && email.is_none() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), email = COALESCE($3, email), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Returns the compact projection used in responses
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Extracts the local part of an email address (`alice` from `alice@example.com`)
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("alice@example.com"), "alice");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
        assert_eq!(local_part("a@b@c"), "a");
    }

    #[test]
    fn test_summary_projection() {
        let user = User {
            id: Uuid::new_v4(),
            external_uid: Some("ext-123".to_string()),
            email: "alice@example.com".to_string(),
            name: Some("Alice".to_string()),
            avatar: None,
            organization_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = user.summary();
        assert_eq!(summary.id, user.id);
        assert_eq!(summary.email, "alice@example.com");
        assert_eq!(summary.name.as_deref(), Some("Alice"));
        assert!(summary.avatar.is_none());
    }
}
