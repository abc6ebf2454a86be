use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, ErrorResponse};
use registrar_models::SemesterId;

use crate::modules::semesters::model::{
    CreateSemesterDto, SemesterFilterParams, SemesterWithStatus, UpdateSemesterDto,
};
use crate::modules::semesters::service::SemesterService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// List semesters
#[utoipa::path(
    get,
    path = "/api/semesters",
    summary = "List semesters",
    params(SemesterFilterParams),
    responses(
        (status = 200, description = "Semesters, newest start date first", body = Vec<SemesterWithStatus>)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn get_semesters(
    State(state): State<AppState>,
    Query(filter): Query<SemesterFilterParams>,
) -> Result<Json<Vec<SemesterWithStatus>>, AppError> {
    let semesters = SemesterService::list_semesters(&state, filter, today()).await?;
    Ok(Json(semesters))
}

/// Get the current semester
#[utoipa::path(
    get,
    path = "/api/semesters/current",
    summary = "Get current semester",
    responses(
        (status = 200, description = "The current semester", body = SemesterWithStatus),
        (status = 404, description = "No semester is current", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn get_current_semester(
    State(state): State<AppState>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::get_current_semester(&state, today()).await?;
    Ok(Json(semester))
}

/// Get a semester by ID
#[utoipa::path(
    get,
    path = "/api/semesters/{id}",
    summary = "Get semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Semester details", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn get_semester_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::get_semester(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}

/// Create a semester
#[utoipa::path(
    post,
    path = "/api/semesters",
    summary = "Create semester",
    request_body = CreateSemesterDto,
    responses(
        (status = 201, description = "Semester created", body = SemesterWithStatus),
        (status = 400, description = "Malformed body or lifecycle flags supplied", body = ErrorResponse),
        (status = 422, description = "Invalid dates or names", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn create_semester(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSemesterDto>,
) -> Result<(StatusCode, Json<SemesterWithStatus>), AppError> {
    let semester = SemesterService::create_semester(&state, dto, today()).await?;
    Ok((StatusCode::CREATED, Json(semester)))
}

/// Update a semester
#[utoipa::path(
    put,
    path = "/api/semesters/{id}",
    summary = "Update semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    request_body = UpdateSemesterDto,
    responses(
        (status = 200, description = "Semester updated", body = SemesterWithStatus),
        (status = 400, description = "Malformed body or lifecycle flags supplied", body = ErrorResponse),
        (status = 404, description = "Semester not found", body = ErrorResponse),
        (status = 422, description = "Invalid dates or names", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn update_semester(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSemesterDto>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester =
        SemesterService::update_semester(&state, SemesterId::from(id), dto, today()).await?;
    Ok(Json(semester))
}

/// Delete a semester
#[utoipa::path(
    delete,
    path = "/api/semesters/{id}",
    summary = "Delete semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 204, description = "Semester deleted"),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn delete_semester(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SemesterService::delete_semester(&state, SemesterId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make this the only current semester
#[utoipa::path(
    post,
    path = "/api/semesters/{id}/set-current",
    summary = "Set current semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Semester is now current", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn set_current_semester(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::set_current_semester(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}

/// Close a semester
#[utoipa::path(
    post,
    path = "/api/semesters/{id}/close",
    summary = "Close semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Semester closed", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn close_semester(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::close_semester(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}

/// Reopen a closed semester
#[utoipa::path(
    post,
    path = "/api/semesters/{id}/reopen",
    summary = "Reopen semester",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Semester reopened", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn reopen_semester(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::reopen_semester(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}

/// Open registration from yesterday for one month
#[utoipa::path(
    post,
    path = "/api/semesters/{id}/open-registration",
    summary = "Open registration",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Registration opened", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn open_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::open_registration(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}

/// End registration as of yesterday
#[utoipa::path(
    post,
    path = "/api/semesters/{id}/close-registration",
    summary = "Close registration",
    params(
        ("id" = Uuid, Path, description = "Semester ID")
    ),
    responses(
        (status = 200, description = "Registration closed", body = SemesterWithStatus),
        (status = 404, description = "Semester not found", body = ErrorResponse)
    ),
    tag = "Semesters"
)]
#[instrument(skip(state))]
pub async fn close_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SemesterWithStatus>, AppError> {
    let semester = SemesterService::close_registration(&state, SemesterId::from(id), today()).await?;
    Ok(Json(semester))
}
