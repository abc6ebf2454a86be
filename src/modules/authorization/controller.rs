use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::AppError;
use registrar_models::{PermissionCheckParams, PermissionCheckResponse, RoleId};

use crate::modules::authorization::engine::check_role_permission;
use crate::state::AppState;

/// Check whether a role may perform an action
///
/// Unknown roles and pairs outside the catalog are answered with `allowed: false`.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/can",
    summary = "Check role permission",
    params(
        ("id" = Uuid, Path, description = "Role ID"),
        PermissionCheckParams
    ),
    responses(
        (status = 200, description = "Authorization decision", body = PermissionCheckResponse),
        (status = 400, description = "Missing module or action")
    ),
    tag = "Authorization"
)]
#[instrument(skip(state))]
pub async fn check_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PermissionCheckParams>,
) -> Result<Json<PermissionCheckResponse>, AppError> {
    let role_id = RoleId::from(id);
    let allowed = check_role_permission(
        &state.catalog,
        state.roles.as_ref(),
        role_id,
        &params.module,
        &params.action,
    )
    .await?;

    Ok(Json(PermissionCheckResponse {
        role_id,
        module: params.module,
        action: params.action,
        allowed,
    }))
}
