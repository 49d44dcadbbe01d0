use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file provided")]
    MissingFile,

    #[error("Invalid file type '{0}'. Please upload a PDF, DOC, or DOCX file.")]
    UnsupportedType(String),

    #[error("File size too large. Please upload a file smaller than {limit_mb}MB.")]
    FileTooLarge { limit_mb: usize },

    #[error("Processing timeout. Please try with a smaller file or try again later.")]
    Timeout,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn file_too_large(limit_bytes: usize) -> Self {
        AppError::FileTooLarge {
            limit_mb: limit_bytes.div_ceil(1024 * 1024),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile
            | AppError::UnsupportedType(_)
            | AppError::FileTooLarge { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingFile => "MISSING_FILE",
            AppError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::Timeout => "TIMEOUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                "An AI processing error occurred. Please try again.".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "Internal server error. Please try again.".to_string()
            }
            AppError::Timeout => {
                tracing::warn!("Request deadline exceeded");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}
