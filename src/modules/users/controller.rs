use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use registrar_core::{AppError, ErrorResponse};
use registrar_models::{AccountWithRoles, CreateAccountDto, RegenerateMatriculeDto, UserId};
use tracing::instrument;

use crate::modules::matricules::model::MatriculeAssignment;
use crate::modules::users::service::AccountService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateAccountDto,
    responses(
        (status = 201, description = "Account created with its matricule", body = AccountWithRoles),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email or matricule already taken", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 503, description = "No free matricule could be generated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAccountDto>,
) -> Result<(StatusCode, Json<AccountWithRoles>), AppError> {
    let account =
        AccountService::create_account(&state.matricules, state.events.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account details", body = AccountWithRoles),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<AccountWithRoles>, AppError> {
    let account = AccountService::get_account(&state.matricules, id).await?;
    Ok(Json(account))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/matricule",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = RegenerateMatriculeDto,
    responses(
        (status = 200, description = "Matricule assigned or kept", body = MatriculeAssignment),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 503, description = "No free matricule could be generated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn regenerate_matricule(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(dto): Json<RegenerateMatriculeDto>,
) -> Result<Json<MatriculeAssignment>, AppError> {
    let assignment =
        AccountService::regenerate_matricule(&state.matricules, state.events.as_ref(), id, dto.force)
            .await?;
    Ok(Json(assignment))
}
