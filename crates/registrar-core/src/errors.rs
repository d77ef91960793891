use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Failures of identifier generation, parsing, and lookup.
#[derive(Debug, thiserror::Error)]
pub enum MatriculeError {
    #[error("failed to generate identifier for {scope}: {reason}")]
    GenerationFailed { scope: String, reason: String },

    #[error("invalid identifier format: {0}")]
    InvalidFormat(String),

    #[error("identifier already exists: {0}")]
    AlreadyExists(String),

    #[error("no role found for identifier: {0}")]
    RoleNotFound(String),

    #[error("failed to parse identifier: {0}")]
    ParsingFailed(String),

    #[error("{kind} not found: {id}")]
    ModelNotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Storage(#[from] Error),
}

impl MatriculeError {
    pub fn generation_failed(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            scope: scope.into(),
            reason: reason.into(),
        }
    }

    pub fn model_not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::ModelNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// HTTP status this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFormat(_) | Self::ParsingFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::RoleNotFound(_) | Self::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            Self::GenerationFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "identifier already exists: PROF26001")]
    pub error: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, "Request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl From<MatriculeError> for AppError {
    fn from(err: MatriculeError) -> Self {
        Self::new(err.status(), err)
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            MatriculeError::InvalidFormat("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            MatriculeError::ParsingFailed("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            MatriculeError::AlreadyExists("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MatriculeError::RoleNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MatriculeError::model_not_found("user", "42").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MatriculeError::generation_failed("PROF26", "exhausted").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            MatriculeError::Storage(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_keeps_matricule_status() {
        let err: AppError = MatriculeError::AlreadyExists("ADM26001".into()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.error.to_string(), "identifier already exists: ADM26001");
    }

    #[test]
    fn test_error_messages() {
        let err = MatriculeError::model_not_found("student", "abc");
        assert_eq!(err.to_string(), "student not found: abc");

        let err = MatriculeError::generation_failed("REG-TG-2026-", "sequence exhausted");
        assert_eq!(
            err.to_string(),
            "failed to generate identifier for REG-TG-2026-: sequence exhausted"
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::not_found(anyhow::anyhow!("missing")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
