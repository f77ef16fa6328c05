use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": code,
            "message": message,
            "error": message,
            "details": Value::Null,
        });

        (status, Json(body)).into_response()
    }
}

impl From<modlike_core::error::CoreError> for ApiError {
    fn from(e: modlike_core::error::CoreError) -> Self {
        use modlike_core::error::CoreError;
        match e {
            CoreError::NotFound => ApiError::NotFound,
            CoreError::Forbidden => {
                ApiError::Forbidden("you do not have permission to access this event".into())
            }
            CoreError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            CoreError::Validation(msg) => ApiError::BadRequest(msg),
            CoreError::CapacityExceeded => ApiError::BadRequest("event is full".into()),
            CoreError::AlreadyEnrolled => ApiError::BadRequest("already enrolled".into()),
            CoreError::SelfEnrollment => {
                ApiError::Forbidden("organizer cannot enroll in their own event".into())
            }
            CoreError::InvalidTransition { from, action } => {
                ApiError::Conflict(format!("cannot {action} an event in status {from}"))
            }
            CoreError::Database(_) => ApiError::Internal(anyhow::anyhow!("database error")),
            CoreError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<modlike_db::DbError> for ApiError {
    fn from(e: modlike_db::DbError) -> Self {
        match e {
            modlike_db::DbError::NotFound => ApiError::NotFound,
            modlike_db::DbError::Sqlx(_) => ApiError::Internal(anyhow::anyhow!("database error")),
        }
    }
}

impl From<modlike_media::StorageError> for ApiError {
    fn from(e: modlike_media::StorageError) -> Self {
        use modlike_media::StorageError;
        match e {
            StorageError::UnsupportedType(_) | StorageError::TooLarge { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            StorageError::Io(io) => ApiError::Internal(anyhow::anyhow!(io)),
        }
    }
}
