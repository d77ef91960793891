use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use registrar_core::{AppError, ErrorResponse};
use registrar_models::{
    CreateEnrollmentDto, Enrollment, RegenerateMatriculeDto, StudentId, StudentMatriculeDto,
};
use tracing::instrument;

use crate::modules::matricules::model::MatriculeAssignment;
use crate::modules::students::service::EnrollmentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Student enrolled with a registration number", body = Enrollment),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Account or class not found", body = ErrorResponse),
        (status = 409, description = "Registration number already taken", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 503, description = "No free registration number could be generated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment =
        EnrollmentService::create_enrollment(&state.matricules, state.events.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Enrollment),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::get_enrollment(&state.matricules, id).await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/matricule",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = StudentMatriculeDto,
    responses(
        (status = 200, description = "Student matricule assigned or kept", body = MatriculeAssignment),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 503, description = "No free matricule could be generated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn generate_student_matricule(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
    Json(dto): Json<StudentMatriculeDto>,
) -> Result<Json<MatriculeAssignment>, AppError> {
    let assignment = EnrollmentService::generate_student_matricule(
        &state.matricules,
        state.events.as_ref(),
        id,
        dto.force,
    )
    .await?;
    Ok(Json(assignment))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/registration-number",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = RegenerateMatriculeDto,
    responses(
        (status = 200, description = "Registration number replaced or kept", body = MatriculeAssignment),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 503, description = "No free registration number could be generated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn regenerate_registration_number(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
    Json(dto): Json<RegenerateMatriculeDto>,
) -> Result<Json<MatriculeAssignment>, AppError> {
    let assignment = EnrollmentService::regenerate_registration_number(
        &state.matricules,
        state.events.as_ref(),
        id,
        dto.force,
    )
    .await?;
    Ok(Json(assignment))
}
