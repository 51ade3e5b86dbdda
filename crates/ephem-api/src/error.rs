use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ephem_core::error::CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller contract violation (wrong number of records).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No backend serves the labels.
    #[error("{0}")]
    Routing(String),

    /// Stored job payload could not be decoded.
    #[error("invalid job content: {0}")]
    InvalidContent(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Config(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Routing(_) | ApiError::InvalidContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Routing { .. } => ApiError::Routing(e.to_string()),
            CoreError::Config(msg) => ApiError::Config(msg),
            CoreError::Model(m) if m.is_invalid_content() => ApiError::InvalidContent(m.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
