use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing required fields: {}.", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("No valid recipient email addresses provided.")]
    NoRecipients,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Attachment exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport initialization failed: {0}")]
    TransportInit(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Tracked file error: {0}")]
    TrackedFile(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::Validation { .. } | AppError::NoRecipients => {
                (StatusCode::BAD_REQUEST, self.to_string(), None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string(), None)
            }
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Email server configuration error.".to_string(),
                Some(msg.clone()),
            ),
            AppError::TransportInit(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize email service.".to_string(),
                Some(msg.clone()),
            ),
            AppError::Store(msg) | AppError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
            // The tracking endpoint answers in plain text, never JSON.
            AppError::TrackedFile(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain")],
                    "Error accessing the document. Please try again later.",
                )
                    .into_response();
            }
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<::redis::RedisError> for AppError {
    fn from(err: ::redis::RedisError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed form data: {}", err.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
