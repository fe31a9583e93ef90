/// Database models for TaskHive
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Identity records, created on first sign-in or as placeholders
/// - `organization`: Tenant boundary, owned by exactly one user
/// - `project`: Unit of work scoped to one organization
/// - `member`: Role assignment linking a user to an organization/project
/// - `task`: Assignable unit of work with a tri-state status
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::organization::Organization;
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let org = Organization::create(&pool, "Acme Corp", owner_id).await?;
/// println!("Created organization: {}", org.id);
/// # Ok(())
/// # }
/// ```

pub mod member;
pub mod organization;
pub mod project;
pub mod task;
pub mod user;
