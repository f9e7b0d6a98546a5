//! Common error types for the try-on gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl AppError {
    /// Stable category tag reported to clients
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Decode(_) => "decode_error",
            AppError::InvalidImage(_) => "invalid_image",
            AppError::InvalidParameter(_) => "invalid_parameter",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::BackendUnavailable(_) => "backend_unavailable",
            AppError::Inference(_) => "inference_error",
            AppError::Infrastructure(_) => "infrastructure_error",
            AppError::Timeout(_) => "timeout",
        }
    }
}

/// Error response format (OpenAI compatible)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::Config(_) | AppError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error")
            }
            AppError::Decode(_)
            | AppError::InvalidImage(_)
            | AppError::InvalidParameter(_)
            | AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AppError::BackendUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "backend_error"),
            AppError::Inference(_) => (StatusCode::BAD_GATEWAY, "backend_error"),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
        };

        // Server-side detail stays in the logs; clients get a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?self, "Request failed with server error");
            "Internal server error while processing the request".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message,
                r#type: error_type.to_string(),
                code: Some(self.category().to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
