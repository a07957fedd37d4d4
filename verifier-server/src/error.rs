//! Error handling

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use helm_verifier_core::VerifyError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Client errors
    ValidationError(String),
    PayloadTooLarge(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        if err.is_client_error() {
            if let Some(detail) = err.detail() {
                tracing::warn!("Rejected upload: {} ({})", err, detail);
            }
            AppError::ValidationError(err.to_string())
        } else {
            match err.detail() {
                Some(detail) => AppError::InternalError(format!("{}: {}", err, detail)),
                None => AppError::InternalError(err.to_string()),
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Upload exceeds the maximum allowed size".to_string())
        } else {
            tracing::warn!("Unreadable multipart body: {}", err.body_text());
            AppError::ValidationError("Malformed multipart request".to_string())
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::warn!("Multipart rejected: {}", err.body_text());
        AppError::ValidationError("Expected a multipart/form-data upload".to_string())
    }
}
