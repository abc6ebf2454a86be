//! The capability check.
//!
//! [`has_permission`] is a pure function of the role, the catalog and the
//! requested pair:
//!
//! 1. a super-admin role is allowed everything, even pairs the catalog lacks;
//! 2. a pair outside the catalog is denied;
//! 3. otherwise the role must hold the pair.
//!
//! There are no wildcards and no role inheritance.

use registrar_core::{AppError, PermissionCatalog};
use registrar_models::{Role, RoleId};
use tracing::{debug, instrument};

use crate::metrics::track_authorization_decision;
use crate::store::RoleRepository;

pub fn has_permission(catalog: &PermissionCatalog, role: &Role, module: &str, action: &str) -> bool {
    if role.is_super_admin {
        return true;
    }
    if !catalog.contains(module, action) {
        return false;
    }
    role.has_capability(module, action)
}

/// Resolves `role_id` and checks it; an unknown role is denied.
#[instrument(skip(catalog, roles))]
pub async fn check_role_permission(
    catalog: &PermissionCatalog,
    roles: &dyn RoleRepository,
    role_id: RoleId,
    module: &str,
    action: &str,
) -> Result<bool, AppError> {
    let allowed = match roles.find(role_id).await? {
        Some(role) => has_permission(catalog, &role, module, action),
        None => {
            debug!(%role_id, "Unknown role, denying");
            false
        }
    };

    debug!(%role_id, module, action, allowed, "Authorization decision");
    track_authorization_decision(allowed);
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use registrar_core::Capability;

    use crate::store::InMemoryRoleRepository;

    fn role(super_admin: bool, caps: &[(&str, &str)]) -> Role {
        let now = Utc::now();
        Role {
            id: RoleId::new(),
            name: "r".to_string(),
            name_localized: "r".to_string(),
            description: None,
            description_localized: None,
            color: None,
            icon: None,
            is_system: super_admin,
            is_super_admin: super_admin,
            capabilities: caps.iter().map(|(m, a)| Capability::new(*m, *a)).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_super_admin_allowed_everything() {
        let catalog = PermissionCatalog::builtin();
        let admin = role(true, &[]);
        assert!(has_permission(&catalog, &admin, "students", "delete"));
        assert!(has_permission(&catalog, &admin, "spaceships", "launch"));
    }

    #[test]
    fn test_member_capability_allowed() {
        let catalog = PermissionCatalog::builtin();
        let lecturer = role(false, &[("exams", "grades")]);
        assert!(has_permission(&catalog, &lecturer, "exams", "grades"));
        assert!(!has_permission(&catalog, &lecturer, "exams", "delete"));
    }

    #[test]
    fn test_pair_outside_catalog_denied_even_if_held() {
        // A capability that slipped into storage but is no longer in the catalog.
        let catalog = PermissionCatalog::builtin();
        let stale = role(false, &[("grading", "publish")]);
        assert!(!has_permission(&catalog, &stale, "grading", "publish"));
    }

    #[test]
    fn test_no_inheritance_between_actions() {
        let catalog = PermissionCatalog::builtin();
        let editor = role(false, &[("students", "edit")]);
        assert!(!has_permission(&catalog, &editor, "students", "view"));
    }

    #[tokio::test]
    async fn test_unknown_role_denied() {
        let catalog = PermissionCatalog::builtin();
        let roles = InMemoryRoleRepository::new();
        let allowed = check_role_permission(&catalog, &roles, RoleId::new(), "students", "view")
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_check_role_permission_resolves_role() {
        let catalog = PermissionCatalog::builtin();
        let roles = InMemoryRoleRepository::new();
        let finance = role(false, &[("finance", "approve")]);
        roles.insert(&finance).await.unwrap();

        assert!(
            check_role_permission(&catalog, &roles, finance.id, "finance", "approve")
                .await
                .unwrap()
        );
        assert!(
            !check_role_permission(&catalog, &roles, finance.id, "finance", "delete")
                .await
                .unwrap()
        );
    }
}
