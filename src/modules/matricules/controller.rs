use axum::{
    Json,
    extract::{Path, State},
};
use registrar_core::prefixes::DEFAULT_PREFIX;
use registrar_core::{AppError, ErrorResponse};
use tracing::instrument;

use crate::modules::matricules::model::{
    MatriculeInfo, PrefixesResponse, ValidateMatriculeDto, ValidationResponse, ValidationTarget,
};
use crate::modules::matricules::rules::{
    UniqueMatricule, UniqueRegistrationNumber, ValidMatriculeFormat,
};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/matricules/prefixes",
    responses(
        (status = 200, description = "Role prefix table", body = PrefixesResponse)
    ),
    tag = "Matricules"
)]
#[instrument(skip(state))]
pub async fn get_prefixes(State(state): State<AppState>) -> Json<PrefixesResponse> {
    Json(PrefixesResponse {
        prefixes: state.matricules.prefixes().iter().cloned().collect(),
        default_prefix: DEFAULT_PREFIX.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/matricules/{value}",
    params(
        ("value" = String, Path, description = "Matricule or registration number")
    ),
    responses(
        (status = 200, description = "Identifier details", body = MatriculeInfo),
        (status = 422, description = "Not a recognised identifier", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Matricules"
)]
#[instrument(skip(state))]
pub async fn inspect_matricule(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<Json<MatriculeInfo>, AppError> {
    let info = state.matricules.inspect(&value).await?;
    Ok(Json(info))
}

#[utoipa::path(
    post,
    path = "/api/matricules/validate",
    request_body = ValidateMatriculeDto,
    responses(
        (status = 200, description = "Value is acceptable", body = ValidationResponse),
        (status = 409, description = "Value already taken", body = ErrorResponse),
        (status = 422, description = "Malformed value", body = ErrorResponse)
    ),
    tag = "Matricules"
)]
#[instrument(skip(state))]
pub async fn validate_matricule(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ValidateMatriculeDto>,
) -> Result<Json<ValidationResponse>, AppError> {
    let store = state.matricules.store();

    match dto.target {
        ValidationTarget::Format => ValidMatriculeFormat.check(&dto.value)?,
        ValidationTarget::Matricule => {
            let rule = UniqueMatricule {
                ignore: dto.ignore_user_id,
            };
            rule.check(store, &dto.value).await?;
        }
        ValidationTarget::RegistrationNumber => {
            UniqueRegistrationNumber::default()
                .check(store, &dto.value)
                .await?;
        }
    }

    Ok(Json(ValidationResponse {
        value: dto.value,
        valid: true,
    }))
}
