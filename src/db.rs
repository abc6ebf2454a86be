use registrar_config::{CatalogConfig, CorsConfig, StorageBackend, StorageConfig};
use registrar_core::PermissionCatalog;
use registrar_db::{init_db_pool, run_migrations};

use crate::modules::roles::service::RoleService;
use crate::state::AppState;

/// Loads the permission catalog, from `PERMISSION_CATALOG_PATH` when set.
pub fn load_catalog(config: &CatalogConfig) -> anyhow::Result<PermissionCatalog> {
    match &config.path {
        Some(path) => {
            let catalog = PermissionCatalog::from_json_file(path)?;
            tracing::info!(
                path = %path.display(),
                modules = catalog.modules().len(),
                "Loaded permission catalog from file"
            );
            Ok(catalog)
        }
        None => Ok(PermissionCatalog::builtin()),
    }
}

/// Builds the application state for the configured storage backend.
///
/// For postgres this connects, applies migrations and, unless disabled,
/// seeds the default roles.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let storage = StorageConfig::from_env()?;
    let catalog = load_catalog(&CatalogConfig::from_env())?;

    let state = match storage.backend {
        StorageBackend::Memory => AppState::in_memory(catalog),
        StorageBackend::Postgres => {
            let pool = init_db_pool(&storage).await?;
            run_migrations(&pool).await?;
            AppState::postgres(pool, catalog)
        }
    }
    .with_cors(CorsConfig::from_env());

    tracing::info!(backend = %storage.backend, "Storage initialized");

    if storage.seed_default_roles {
        let inserted = RoleService::seed_default_roles(&state)
            .await
            .map_err(|e| e.error.context("Failed to seed default roles"))?;
        tracing::info!(inserted, "Default roles seeded");
    }

    Ok(state)
}
