use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::models::RsData;

/// ServiceError
///
/// The error kinds a request can surface. Each maps to a fixed
/// `"<status>-<seq>"` code and is rendered through the same `{code, msg}`
/// envelope as success responses. None of these are retried or fatal to the
/// process; every error is scoped to the single request that produced it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or blank required field. The message carries the joined
    /// field-error lines ("field : constraint : message").
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, or expired bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but the access policy denied the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Unknown resource id.
    #[error("{0}")]
    NotFound(String),

    /// Persistence failure. Logged in full, surfaced as a generic message.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "400-1",
            ServiceError::Unauthorized(_) => "401-1",
            ServiceError::Forbidden(_) => "403-1",
            ServiceError::NotFound(_) => "404-1",
            ServiceError::Database(_) => "500-1",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let msg = match &self {
            // Database details stay in the logs, never in the response body.
            ServiceError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "서버 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        let body: RsData<()> = RsData::of(self.code(), msg);
        (self.status(), Json(body)).into_response()
    }
}
