use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use registrar_core::{AppError, Capability, ModuleDefinition};

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleActionsResponse {
    pub module: String,
    pub actions: Vec<String>,
}

/// List every capability in the catalog
#[utoipa::path(
    get,
    path = "/api/permissions",
    summary = "List capabilities",
    responses(
        (status = 200, description = "All capabilities, module by module", body = Vec<Capability>)
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn get_capabilities(State(state): State<AppState>) -> Json<Vec<Capability>> {
    Json(state.catalog.capabilities())
}

/// List catalog modules in order
#[utoipa::path(
    get,
    path = "/api/permissions/modules",
    summary = "List modules",
    responses(
        (status = 200, description = "Catalog modules with their actions", body = Vec<ModuleDefinition>)
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn get_modules(State(state): State<AppState>) -> Json<Vec<ModuleDefinition>> {
    Json(state.catalog.module_definitions().to_vec())
}

/// List the actions of one module
#[utoipa::path(
    get,
    path = "/api/permissions/modules/{module}/actions",
    summary = "List module actions",
    params(
        ("module" = String, Path, description = "Module identifier")
    ),
    responses(
        (status = 200, description = "Actions in catalog order", body = ModuleActionsResponse),
        (status = 404, description = "Module not found")
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn get_module_actions(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> Result<Json<ModuleActionsResponse>, AppError> {
    let actions = state.catalog.actions_of(&module)?.to_vec();
    Ok(Json(ModuleActionsResponse { module, actions }))
}
