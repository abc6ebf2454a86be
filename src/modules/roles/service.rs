use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use registrar_core::{AppError, Capability};
use registrar_models::RoleId;

use crate::metrics::{track_role_created, track_role_deleted};
use crate::state::AppState;

use super::defaults::DEFAULT_ROLES;
use super::model::{CreateRoleDto, DuplicateRoleDto, Role, RoleWithStats, UpdateRoleDto};

pub struct RoleService;

impl RoleService {
    /// Trims `value`, rejecting it when nothing is left.
    fn required_text(field: &str, value: &str) -> Result<String, AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation(
                field,
                anyhow::anyhow!("{} must not be empty", field),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn capability_set(
        state: &AppState,
        capabilities: &[Capability],
    ) -> Result<BTreeSet<Capability>, AppError> {
        state.catalog.validate(capabilities)?;
        Ok(capabilities.iter().cloned().collect())
    }

    async fn find_role(state: &AppState, id: RoleId) -> Result<Role, AppError> {
        state
            .roles
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Role not found")))
    }

    async fn with_stats(state: &AppState, role: Role) -> Result<RoleWithStats, AppError> {
        let users_count = state.user_counts.users_count(role.id).await?;
        Ok(RoleWithStats { role, users_count })
    }

    /// All roles, system roles first, then by name.
    #[instrument(skip(state))]
    pub async fn list_roles(state: &AppState) -> Result<Vec<RoleWithStats>, AppError> {
        let mut roles = state.roles.list().await?;
        roles.sort_by(|a, b| {
            b.is_system
                .cmp(&a.is_system)
                .then_with(|| a.name.cmp(&b.name))
        });

        let counts: HashMap<RoleId, i64> = state.user_counts.all_counts().await?;
        Ok(roles
            .into_iter()
            .map(|role| {
                let users_count = counts.get(&role.id).copied().unwrap_or(0);
                RoleWithStats { role, users_count }
            })
            .collect())
    }

    #[instrument(skip(state))]
    pub async fn get_role(state: &AppState, id: RoleId) -> Result<RoleWithStats, AppError> {
        let role = Self::find_role(state, id).await?;
        Self::with_stats(state, role).await
    }

    #[instrument(skip(state))]
    pub async fn create_role(state: &AppState, dto: CreateRoleDto) -> Result<RoleWithStats, AppError> {
        dto.validate().map_err(AppError::from_validation_errors)?;

        let name = Self::required_text("name", &dto.name)?;
        let name_localized = Self::required_text("name_localized", &dto.name_localized)?;
        let capabilities = Self::capability_set(state, &dto.capabilities)?;

        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name,
            name_localized,
            description: dto.description,
            description_localized: dto.description_localized,
            color: dto.color,
            icon: dto.icon,
            is_system: false,
            is_super_admin: false,
            capabilities,
            created_at: now,
            updated_at: now,
        };

        state.roles.insert(&role).await?;
        track_role_created();
        info!(role_id = %role.id, name = %role.name, "Role created");

        Self::with_stats(state, role).await
    }

    #[instrument(skip(state))]
    pub async fn update_role(
        state: &AppState,
        id: RoleId,
        dto: UpdateRoleDto,
    ) -> Result<RoleWithStats, AppError> {
        dto.validate().map_err(AppError::from_validation_errors)?;

        let name = dto
            .name
            .as_deref()
            .map(|name| Self::required_text("name", name))
            .transpose()?;
        let name_localized = dto
            .name_localized
            .as_deref()
            .map(|name| Self::required_text("name_localized", name))
            .transpose()?;
        let capabilities = dto
            .capabilities
            .as_deref()
            .map(|capabilities| Self::capability_set(state, capabilities))
            .transpose()?;

        let edit = |role: &mut Role| {
            if let Some(name) = &name {
                role.name = name.clone();
            }
            if let Some(name_localized) = &name_localized {
                role.name_localized = name_localized.clone();
            }
            if let Some(capabilities) = &capabilities {
                role.capabilities = capabilities.clone();
            }
            if dto.description.is_some() {
                role.description = dto.description.clone();
            }
            if dto.description_localized.is_some() {
                role.description_localized = dto.description_localized.clone();
            }
            if dto.color.is_some() {
                role.color = dto.color.clone();
            }
            if dto.icon.is_some() {
                role.icon = dto.icon.clone();
            }
            // The stored set may predate a narrower catalog.
            state.catalog.validate(&role.capabilities)
        };

        let saved = state.roles.update(id, &edit).await?;
        Self::with_stats(state, saved).await
    }

    #[instrument(skip(state))]
    pub async fn delete_role(state: &AppState, id: RoleId) -> Result<(), AppError> {
        let role = Self::find_role(state, id).await?;

        if role.is_system {
            return Err(AppError::conflict(anyhow::anyhow!(
                "System role '{}' cannot be deleted",
                role.name
            )));
        }

        state.roles.delete(id).await?;
        track_role_deleted();
        info!(role_id = %id, name = %role.name, "Role deleted");
        Ok(())
    }

    #[instrument(skip(state))]
    pub async fn grant_capabilities(
        state: &AppState,
        id: RoleId,
        capabilities: Vec<Capability>,
    ) -> Result<RoleWithStats, AppError> {
        state.catalog.validate(&capabilities)?;
        let role = state.roles.grant(id, &capabilities).await?;
        Self::with_stats(state, role).await
    }

    #[instrument(skip(state))]
    pub async fn revoke_capabilities(
        state: &AppState,
        id: RoleId,
        capabilities: Vec<Capability>,
    ) -> Result<RoleWithStats, AppError> {
        state.catalog.validate(&capabilities)?;
        let role = state.roles.revoke(id, &capabilities).await?;
        Self::with_stats(state, role).await
    }

    /// Copies a role under a new name. The copy is never a system role.
    #[instrument(skip(state))]
    pub async fn duplicate_role(
        state: &AppState,
        id: RoleId,
        dto: DuplicateRoleDto,
    ) -> Result<RoleWithStats, AppError> {
        dto.validate().map_err(AppError::from_validation_errors)?;

        let source = Self::find_role(state, id).await?;
        let name = Self::required_text("name", &dto.name)?;
        let name_localized = Self::required_text("name_localized", &dto.name_localized)?;

        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name,
            name_localized,
            is_system: false,
            is_super_admin: false,
            created_at: now,
            updated_at: now,
            ..source
        };

        state.roles.insert(&role).await?;
        track_role_created();
        info!(role_id = %role.id, source_id = %id, "Role duplicated");

        Self::with_stats(state, role).await
    }

    /// Inserts every default role whose name is not taken yet.
    ///
    /// Returns how many roles were inserted; running it again inserts none.
    #[instrument(skip(state))]
    pub async fn seed_default_roles(state: &AppState) -> Result<usize, AppError> {
        let mut inserted = 0;

        for default in DEFAULT_ROLES {
            if state.roles.find_by_name(default.name).await?.is_some() {
                continue;
            }

            let mut capabilities = BTreeSet::new();
            for (module, actions) in default.capabilities {
                for action in *actions {
                    let capability = Capability::new(*module, *action);
                    if state.catalog.contains_capability(&capability) {
                        capabilities.insert(capability);
                    } else {
                        warn!(role = default.name, %capability, "Skipping capability missing from catalog");
                    }
                }
            }

            let now = Utc::now();
            let role = Role {
                id: RoleId::new(),
                name: default.name.to_string(),
                name_localized: default.name_localized.to_string(),
                description: Some(default.description.to_string()),
                description_localized: Some(default.description_localized.to_string()),
                color: Some(default.color.to_string()),
                icon: Some(default.icon.to_string()),
                is_system: default.is_system || default.is_super_admin,
                is_super_admin: default.is_super_admin,
                capabilities,
                created_at: now,
                updated_at: now,
            };

            state.roles.insert(&role).await?;
            inserted += 1;
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use registrar_core::PermissionCatalog;

    use super::*;
    use crate::store::{InMemoryRoleRepository, RoleEdit, RoleRepository};

    fn state() -> AppState {
        AppState::in_memory(PermissionCatalog::builtin())
    }

    fn create_dto(name: &str, caps: &[(&str, &str)]) -> CreateRoleDto {
        CreateRoleDto {
            name: name.to_string(),
            name_localized: format!("{} (ar)", name),
            description: None,
            description_localized: None,
            color: Some("#000000".to_string()),
            icon: None,
            capabilities: caps.iter().map(|(m, a)| Capability::new(*m, *a)).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_role_stores_catalog_capabilities() {
        let state = state();
        let created = RoleService::create_role(
            &state,
            create_dto("auditor", &[("finance", "view"), ("finance", "view"), ("reports", "export")]),
        )
        .await
        .unwrap();

        assert!(!created.role.is_system);
        assert!(!created.role.is_super_admin);
        assert_eq!(created.role.capabilities.len(), 2);
        assert!(
            created
                .role
                .capabilities
                .iter()
                .all(|c| state.catalog.contains_capability(c))
        );
        assert_eq!(created.users_count, 0);
    }

    #[tokio::test]
    async fn test_create_role_unknown_capability_leaves_store_unchanged() {
        let state = state();
        let err = RoleService::create_role(&state, create_dto("auditor", &[("finance", "embezzle")]))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("capabilities"));
        assert!(RoleService::list_roles(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_role_blank_name_rejected() {
        let state = state();
        let err = RoleService::create_role(&state, create_dto("   ", &[]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[tokio::test]
    async fn test_update_role_replaces_capabilities_and_keeps_omitted_fields() {
        let state = state();
        let created = RoleService::create_role(&state, create_dto("auditor", &[("finance", "view")]))
            .await
            .unwrap();

        let updated = RoleService::update_role(
            &state,
            created.role.id,
            UpdateRoleDto {
                capabilities: Some(vec![Capability::new("reports", "view")]),
                ..UpdateRoleDto::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.role.name, "auditor");
        assert_eq!(updated.role.color.as_deref(), Some("#000000"));
        assert!(updated.role.has_capability("reports", "view"));
        assert!(!updated.role.has_capability("finance", "view"));
    }

    #[tokio::test]
    async fn test_update_role_unknown_capability_leaves_store_unchanged() {
        let state = state();
        let created = RoleService::create_role(&state, create_dto("auditor", &[("finance", "view")]))
            .await
            .unwrap();

        let err = RoleService::update_role(
            &state,
            created.role.id,
            UpdateRoleDto {
                name: Some("renamed".to_string()),
                capabilities: Some(vec![Capability::new("finance", "teleport")]),
                ..UpdateRoleDto::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());

        let stored = RoleService::get_role(&state, created.role.id).await.unwrap();
        assert_eq!(stored.role.name, "auditor");
        assert!(stored.role.has_capability("finance", "view"));
    }

    /// Commits a grant on the inner store just before each update runs.
    struct GrantBeforeUpdate {
        inner: InMemoryRoleRepository,
        grant: Capability,
    }

    #[async_trait]
    impl RoleRepository for GrantBeforeUpdate {
        async fn list(&self) -> Result<Vec<Role>, AppError> {
            self.inner.list().await
        }

        async fn find(&self, id: RoleId) -> Result<Option<Role>, AppError> {
            self.inner.find(id).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
            self.inner.find_by_name(name).await
        }

        async fn insert(&self, role: &Role) -> Result<(), AppError> {
            self.inner.insert(role).await
        }

        async fn update(&self, id: RoleId, edit: RoleEdit<'_>) -> Result<Role, AppError> {
            self.inner.grant(id, &[self.grant.clone()]).await?;
            self.inner.update(id, edit).await
        }

        async fn grant(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
            self.inner.grant(id, capabilities).await
        }

        async fn revoke(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
            self.inner.revoke(id, capabilities).await
        }

        async fn delete(&self, id: RoleId) -> Result<(), AppError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_rename_keeps_capability_granted_during_update() {
        let state = AppState {
            roles: Arc::new(GrantBeforeUpdate {
                inner: InMemoryRoleRepository::new(),
                grant: Capability::new("finance", "approve"),
            }),
            ..state()
        };
        let created = RoleService::create_role(&state, create_dto("auditor", &[("finance", "view")]))
            .await
            .unwrap();

        let updated = RoleService::update_role(
            &state,
            created.role.id,
            UpdateRoleDto {
                name: Some("controller".to_string()),
                ..UpdateRoleDto::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.role.name, "controller");
        assert!(updated.role.has_capability("finance", "view"));
        assert!(updated.role.has_capability("finance", "approve"));

        let stored = RoleService::get_role(&state, created.role.id).await.unwrap();
        assert_eq!(stored.role.capabilities, updated.role.capabilities);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_renames_and_grants_keep_every_grant() {
        let state = state();
        let created = RoleService::create_role(&state, create_dto("auditor", &[("finance", "view")]))
            .await
            .unwrap();
        let id = created.role.id;
        let actions: &'static [&str; 5] = &["create", "edit", "delete", "approve", "reports"];

        let mut tasks = Vec::new();
        for (i, action) in actions.iter().enumerate() {
            let granting = state.clone();
            tasks.push(tokio::spawn(async move {
                RoleService::grant_capabilities(
                    &granting,
                    id,
                    vec![Capability::new("finance", *action)],
                )
                .await
                .map(|_| ())
            }));
            let renaming = state.clone();
            tasks.push(tokio::spawn(async move {
                RoleService::update_role(
                    &renaming,
                    id,
                    UpdateRoleDto {
                        name: Some(format!("auditor-{}", i)),
                        ..UpdateRoleDto::default()
                    },
                )
                .await
                .map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = RoleService::get_role(&state, id).await.unwrap();
        assert!(stored.role.name.starts_with("auditor-"));
        assert!(stored.role.has_capability("finance", "view"));
        for action in actions {
            assert!(stored.role.has_capability("finance", action));
        }
    }

    #[tokio::test]
    async fn test_update_rejects_capabilities_dropped_from_catalog() {
        let catalog = PermissionCatalog::from_json_str(
            r#"[{"id": "reports", "name": "Reports", "name_localized": "التقارير", "actions": ["view"]}]"#,
        )
        .unwrap();
        let state = AppState::in_memory(catalog);
        let now = Utc::now();
        let stale = Role {
            id: RoleId::new(),
            name: "auditor".to_string(),
            name_localized: "auditor (ar)".to_string(),
            description: None,
            description_localized: None,
            color: None,
            icon: None,
            is_system: false,
            is_super_admin: false,
            capabilities: [Capability::new("finance", "view")].into_iter().collect(),
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(&stale).await.unwrap();

        let err = RoleService::update_role(
            &state,
            stale.id,
            UpdateRoleDto {
                name: Some("renamed".to_string()),
                ..UpdateRoleDto::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("capabilities"));

        let stored = state.roles.find(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "auditor");

        let replaced = RoleService::update_role(
            &state,
            stale.id,
            UpdateRoleDto {
                name: Some("renamed".to_string()),
                capabilities: Some(vec![Capability::new("reports", "view")]),
                ..UpdateRoleDto::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(replaced.role.name, "renamed");
        assert!(!replaced.role.has_capability("finance", "view"));
    }

    #[tokio::test]
    async fn test_update_missing_role() {
        let err = RoleService::update_role(&state(), RoleId::new(), UpdateRoleDto::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_system_role_conflicts() {
        let state = state();
        RoleService::seed_default_roles(&state).await.unwrap();
        let admin = state.roles.find_by_name("admin").await.unwrap().unwrap();

        let err = RoleService::delete_role(&state, admin.id).await.unwrap_err();
        assert!(err.is_conflict());

        let roles = RoleService::list_roles(&state).await.unwrap();
        assert!(roles.iter().any(|r| r.role.id == admin.id));
    }

    #[tokio::test]
    async fn test_delete_custom_role() {
        let state = state();
        let created = RoleService::create_role(&state, create_dto("temp", &[]))
            .await
            .unwrap();

        RoleService::delete_role(&state, created.role.id).await.unwrap();
        let err = RoleService::delete_role(&state, created.role.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let state = state();
        assert_eq!(
            RoleService::seed_default_roles(&state).await.unwrap(),
            DEFAULT_ROLES.len()
        );
        assert_eq!(RoleService::seed_default_roles(&state).await.unwrap(), 0);

        let affairs = state
            .roles
            .find_by_name("student_affairs")
            .await
            .unwrap()
            .unwrap();
        assert!(affairs.is_system);
        assert!(affairs.has_capability("registration", "open_close_registration"));
    }

    #[tokio::test]
    async fn test_list_orders_system_roles_first() {
        let state = state();
        RoleService::create_role(&state, create_dto("aaa-custom", &[]))
            .await
            .unwrap();
        RoleService::seed_default_roles(&state).await.unwrap();

        let roles = RoleService::list_roles(&state).await.unwrap();
        let first_custom = roles.iter().position(|r| !r.role.is_system).unwrap();
        assert!(roles[..first_custom].iter().all(|r| r.role.is_system));
        assert!(roles[first_custom..].iter().all(|r| !r.role.is_system));
        assert_eq!(roles[0].role.name, "admin");
    }

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let state = state();
        let created = RoleService::create_role(&state, create_dto("clerk", &[]))
            .await
            .unwrap();

        let granted = RoleService::grant_capabilities(
            &state,
            created.role.id,
            vec![Capability::new("students", "view"), Capability::new("students", "export")],
        )
        .await
        .unwrap();
        assert_eq!(granted.role.capabilities.len(), 2);

        let revoked = RoleService::revoke_capabilities(
            &state,
            created.role.id,
            vec![Capability::new("students", "export"), Capability::new("courses", "view")],
        )
        .await
        .unwrap();
        assert_eq!(revoked.role.capabilities.len(), 1);
        assert!(revoked.role.has_capability("students", "view"));

        let err = RoleService::grant_capabilities(
            &state,
            created.role.id,
            vec![Capability::new("students", "fly")],
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_duplicate_system_role_is_plain_copy() {
        let state = state();
        RoleService::seed_default_roles(&state).await.unwrap();
        let affairs = state
            .roles
            .find_by_name("student_affairs")
            .await
            .unwrap()
            .unwrap();

        let copy = RoleService::duplicate_role(
            &state,
            affairs.id,
            DuplicateRoleDto {
                name: "student_affairs_night".to_string(),
                name_localized: "شؤون الطلاب - مسائي".to_string(),
            },
        )
        .await
        .unwrap();

        assert_ne!(copy.role.id, affairs.id);
        assert!(!copy.role.is_system);
        assert_eq!(copy.role.capabilities, affairs.capabilities);
        assert_eq!(copy.role.color, affairs.color);
    }

    #[tokio::test]
    async fn test_users_count_comes_from_source() {
        let counts = std::sync::Arc::new(crate::store::InMemoryUserCounts::new());
        let state = AppState::with_user_counts(PermissionCatalog::builtin(), counts.clone());
        let created = RoleService::create_role(&state, create_dto("tutor", &[]))
            .await
            .unwrap();

        counts.set(created.role.id, 12).unwrap();
        let fetched = RoleService::get_role(&state, created.role.id).await.unwrap();
        assert_eq!(fetched.users_count, 12);
        let listed = RoleService::list_roles(&state).await.unwrap();
        assert_eq!(listed[0].users_count, 12);
    }
}
