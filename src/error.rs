//! Error types for chatgate
//!
//! Every rejection the proxy produces is rendered as `{"error": true, "msg": ...}`
//! so the web client can show it as a toast.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proxy::UpstreamFailure;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("you are not allowed to request {0}")]
    ForbiddenPath(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("you are not allowed to use {0} model")]
    ForbiddenModel(String),

    #[error("{}", .0.body_text())]
    InvalidBody(#[from] BytesRejection),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamFailure),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub msg: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: true,
            msg: msg.into(),
        }
    }
}

impl AppError {
    /// HTTP status this error is surfaced with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ForbiddenPath(_) | AppError::ForbiddenModel(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidBody(rejection) => rejection.status(),
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ForbiddenPath(_) => "forbidden_path",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::ForbiddenModel(_) => "forbidden_model",
            AppError::InvalidBody(_) => "invalid_body",
            AppError::Upstream(_) => "upstream",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            AppError::Upstream(failure) => failure.pretty(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(msg))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
