use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Multipart(err) => err.status(),
            AppError::Database(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error, message, details) = match &self {
            AppError::Forbidden(msg) => ("Forbidden", msg.clone(), None),
            AppError::NotFound(msg) => ("Not Found", msg.clone(), None),
            AppError::BadRequest(msg) => ("Bad Request", msg.clone(), None),
            AppError::Conflict(msg) => ("Conflict", msg.clone(), None),
            AppError::PayloadTooLarge(msg) => ("Payload Too Large", msg.clone(), None),
            AppError::Multipart(err) => ("Bad Request", "Invalid multipart body".to_string(), Some(err.body_text())),
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                ("Internal Server Error", "Database error".to_string(), Some(err.to_string()))
            }
            AppError::Io(err) => {
                tracing::error!("IO error: {}", err);
                ("Internal Server Error", "IO error".to_string(), None)
            }
        };

        if status.is_client_error() {
            tracing::warn!("Client error {}: {}", status.as_u16(), message);
        }

        let body = ErrorResponse {
            code: status.as_u16(),
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}
