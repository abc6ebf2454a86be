use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, ErrorResponse};
use registrar_models::RoleId;

use crate::modules::roles::model::{
    CapabilitiesDto, CreateRoleDto, DuplicateRoleDto, RoleWithStats, UpdateRoleDto,
};
use crate::modules::roles::service::RoleService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List roles
#[utoipa::path(
    get,
    path = "/api/roles",
    summary = "List roles",
    responses(
        (status = 200, description = "System roles first, then by name", body = Vec<RoleWithStats>)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn get_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleWithStats>>, AppError> {
    let roles = RoleService::list_roles(&state).await?;
    Ok(Json(roles))
}

/// Get a role by ID
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    summary = "Get role",
    params(
        ("id" = Uuid, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role details", body = RoleWithStats),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn get_role_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleWithStats>, AppError> {
    let role = RoleService::get_role(&state, RoleId::from(id)).await?;
    Ok(Json(role))
}

/// Create a custom role
#[utoipa::path(
    post,
    path = "/api/roles",
    summary = "Create role",
    request_body = CreateRoleDto,
    responses(
        (status = 201, description = "Role created", body = RoleWithStats),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 422, description = "Invalid name or unknown capability", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateRoleDto>,
) -> Result<(StatusCode, Json<RoleWithStats>), AppError> {
    let role = RoleService::create_role(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Update a role
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    summary = "Update role",
    params(
        ("id" = Uuid, Path, description = "Role ID")
    ),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated", body = RoleWithStats),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 422, description = "Invalid name or unknown capability", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<Json<RoleWithStats>, AppError> {
    let role = RoleService::update_role(&state, RoleId::from(id), dto).await?;
    Ok(Json(role))
}

/// Delete a custom role
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    summary = "Delete role",
    params(
        ("id" = Uuid, Path, description = "Role ID")
    ),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 409, description = "System roles cannot be deleted", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    RoleService::delete_role(&state, RoleId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant capabilities to a role
#[utoipa::path(
    post,
    path = "/api/roles/{id}/capabilities",
    summary = "Grant capabilities",
    params(
        ("id" = Uuid, Path, description = "Role ID")
    ),
    request_body = CapabilitiesDto,
    responses(
        (status = 200, description = "Updated role", body = RoleWithStats),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 422, description = "Unknown capability", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn grant_capabilities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CapabilitiesDto>,
) -> Result<Json<RoleWithStats>, AppError> {
    let role = RoleService::grant_capabilities(&state, RoleId::from(id), dto.capabilities).await?;
    Ok(Json(role))
}

/// Revoke capabilities from a role
#[utoipa::path(
    delete,
    path = "/api/roles/{id}/capabilities",
    summary = "Revoke capabilities",
    params(
        ("id" = Uuid, Path, description = "Role ID")
    ),
    request_body = CapabilitiesDto,
    responses(
        (status = 200, description = "Updated role", body = RoleWithStats),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 422, description = "Unknown capability", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn revoke_capabilities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CapabilitiesDto>,
) -> Result<Json<RoleWithStats>, AppError> {
    let role = RoleService::revoke_capabilities(&state, RoleId::from(id), dto.capabilities).await?;
    Ok(Json(role))
}

/// Duplicate a role under a new name
#[utoipa::path(
    post,
    path = "/api/roles/{id}/duplicate",
    summary = "Duplicate role",
    params(
        ("id" = Uuid, Path, description = "Source role ID")
    ),
    request_body = DuplicateRoleDto,
    responses(
        (status = 201, description = "Copy created", body = RoleWithStats),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 422, description = "Invalid name", body = ErrorResponse)
    ),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn duplicate_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<DuplicateRoleDto>,
) -> Result<(StatusCode, Json<RoleWithStats>), AppError> {
    let role = RoleService::duplicate_role(&state, RoleId::from(id), dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}
