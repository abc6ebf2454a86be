use std::sync::Arc;

use registrar_config::CorsConfig;
use registrar_core::PermissionCatalog;
use registrar_db::PgPool;

use crate::store::{
    InMemoryRoleRepository, InMemorySemesterRepository, InMemoryUserCounts, PgRoleRepository,
    PgSemesterRepository, PgUserCounts, RoleRepository, SemesterRepository, UserCountSource,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<PermissionCatalog>,
    pub roles: Arc<dyn RoleRepository>,
    pub semesters: Arc<dyn SemesterRepository>,
    pub user_counts: Arc<dyn UserCountSource>,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// State backed by process memory; nothing survives a restart.
    pub fn in_memory(catalog: PermissionCatalog) -> Self {
        Self::with_user_counts(catalog, Arc::new(InMemoryUserCounts::new()))
    }

    /// In-memory state reading role membership from `user_counts`.
    pub fn with_user_counts(
        catalog: PermissionCatalog,
        user_counts: Arc<dyn UserCountSource>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            roles: Arc::new(InMemoryRoleRepository::new()),
            semesters: Arc::new(InMemorySemesterRepository::new()),
            user_counts,
            cors_config: CorsConfig::default(),
        }
    }

    pub fn postgres(pool: PgPool, catalog: PermissionCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            semesters: Arc::new(PgSemesterRepository::new(pool.clone())),
            user_counts: Arc::new(PgUserCounts::new(pool)),
            cors_config: CorsConfig::default(),
        }
    }

    pub fn with_cors(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = cors_config;
        self
    }
}
