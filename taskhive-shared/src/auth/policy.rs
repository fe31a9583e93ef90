/// Authorization policy predicates
///
/// Every mutating endpoint reduces to a handful of facts about the acting
/// user and the resolved entity chain:
///
/// - `is_org_owner`: the actor owns the target organization
/// - `is_project_creator`: the actor created the target project
/// - active membership: a `Member` row with `status = TRUE` exists for the
///   actor in the relevant (organization, project) scope, looked up via
///   [`crate::models::member::Member::find_active`]
///
/// The predicates here are pure functions over already-loaded entities so
/// the policy table can be tested without a database. Handlers combine them
/// with the membership lookups.
///
/// # Action policy (authoritative)
///
/// | Action | Required condition |
/// |---|---|
/// | Create organization | actor owns no organization; name free |
/// | Rename organization | org owner |
/// | Create project | org owner |
/// | Update/delete project | org owner or project creator |
/// | Add member | org owner or project creator |
/// | View project members | org owner, project creator, or active project member |
/// | View organization members | org owner or any active member |
/// | Update/delete member | org owner or project creator; owner-role and self deletes blocked |
/// | Create task | org owner or project creator; project must have active members |
/// | Update task status | active project member appearing in the task's assignment list |
/// | Delete task | unchecked (known gap, reproduced as observed) |

use uuid::Uuid;

use crate::models::member::Member;
use crate::models::organization::Organization;
use crate::models::project::Project;

/// Whether the actor owns the organization
pub fn is_org_owner(org: &Organization, user_id: Uuid) -> bool {
    org.owner_id == user_id
}

/// Whether the actor created the project
pub fn is_project_creator(project: &Project, user_id: Uuid) -> bool {
    project.created_by == user_id
}

/// Whether the actor may manage (update/delete) the project or its members
/// and tasks: organization owner or project creator
pub fn can_manage_project(org: &Organization, project: &Project, user_id: Uuid) -> bool {
    is_org_owner(org, user_id) || is_project_creator(project, user_id)
}

/// Reason a member removal is refused even for an authorized manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemovalDenial {
    /// Members holding the owner role can never be removed
    OwnerRole,

    /// Actors cannot remove their own membership record
    SelfRemoval,
}

impl MemberRemovalDenial {
    /// Human-readable denial message surfaced to the caller
    pub fn message(&self) -> &'static str {
        match self {
            MemberRemovalDenial::OwnerRole => "Cannot delete project owner",
            MemberRemovalDenial::SelfRemoval => "You cannot delete yourself",
        }
    }
}

/// Checks the removal protections that apply on top of manage rights
///
/// Owner-role members are protected unconditionally; even the organization
/// owner cannot remove them. Checked before the self-removal rule so an
/// owner-role self-delete reports the role protection.
pub fn member_removal_denial(member: &Member, actor_id: Uuid) -> Option<MemberRemovalDenial> {
    if member.role == crate::models::member::MemberRole::Owner {
        return Some(MemberRemovalDenial::OwnerRole);
    }

    if member.user_id == actor_id {
        return Some(MemberRemovalDenial::SelfRemoval);
    }

    None
}

/// Whether a member record sits in the expected (organization, project) scope
///
/// Member ids arrive in URLs alongside the organization and project ids;
/// this guards against a member id that resolves to a different scope.
pub fn member_in_scope(member: &Member, organization_id: Uuid, project_id: Uuid) -> bool {
    member.organization_id == organization_id && member.project_id == Some(project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::MemberRole;
    use chrono::Utc;
    use sqlx::types::Json;

    fn org(owner_id: Uuid) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "acme".to_string(),
            owner_id,
            invitations: Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn project(organization_id: Uuid, created_by: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "apollo".to_string(),
            description: None,
            organization_id,
            status: crate::models::project::ProjectStatus::Active,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(user_id: Uuid, organization_id: Uuid, project_id: Option<Uuid>, role: MemberRole) -> Member {
        Member {
            id: Uuid::new_v4(),
            user_id,
            organization_id,
            project_id,
            role,
            status: true,
            added_by: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_org_owner_predicate() {
        let owner = Uuid::new_v4();
        let org = org(owner);

        assert!(is_org_owner(&org, owner));
        assert!(!is_org_owner(&org, Uuid::new_v4()));
    }

    #[test]
    fn test_project_creator_predicate() {
        let creator = Uuid::new_v4();
        let project = project(Uuid::new_v4(), creator);

        assert!(is_project_creator(&project, creator));
        assert!(!is_project_creator(&project, Uuid::new_v4()));
    }

    #[test]
    fn test_can_manage_project() {
        let owner = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let org = org(owner);
        let project = project(org.id, creator);

        assert!(can_manage_project(&org, &project, owner));
        assert!(can_manage_project(&org, &project, creator));
        assert!(!can_manage_project(&org, &project, stranger));
    }

    #[test]
    fn test_owner_role_member_is_protected_from_everyone() {
        let org_id = Uuid::new_v4();
        let target = member(Uuid::new_v4(), org_id, Some(Uuid::new_v4()), MemberRole::Owner);

        // Even an unrelated manager cannot remove an owner-role member.
        assert_eq!(
            member_removal_denial(&target, Uuid::new_v4()),
            Some(MemberRemovalDenial::OwnerRole)
        );
    }

    #[test]
    fn test_self_removal_is_blocked() {
        let actor = Uuid::new_v4();
        let target = member(actor, Uuid::new_v4(), Some(Uuid::new_v4()), MemberRole::Member);

        assert_eq!(
            member_removal_denial(&target, actor),
            Some(MemberRemovalDenial::SelfRemoval)
        );
    }

    #[test]
    fn test_ordinary_removal_is_allowed() {
        let target = member(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            MemberRole::Viewer,
        );

        assert_eq!(member_removal_denial(&target, Uuid::new_v4()), None);
    }

    #[test]
    fn test_member_in_scope() {
        let org_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        let m = member(Uuid::new_v4(), org_id, Some(project_id), MemberRole::Member);

        assert!(member_in_scope(&m, org_id, project_id));
        assert!(!member_in_scope(&m, org_id, Uuid::new_v4()));
        assert!(!member_in_scope(&m, Uuid::new_v4(), project_id));

        let org_level = member(Uuid::new_v4(), org_id, None, MemberRole::Owner);
        assert!(!member_in_scope(&org_level, org_id, project_id));
    }
}
