use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Origin not permitted: {0}")]
    CorsDenied(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::CorsDenied(_) => (StatusCode::FORBIDDEN, "CORS_DENIED"),
            AppError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
            AppError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "INVALID_QUERY"),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::DocumentNotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND"),
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.classify();

        // Server-side failures are logged in full and masked for the client.
        let error_message = if status.is_server_error() {
            tracing::error!("{}: {:?}", error_code, self);
            match &self {
                AppError::Serialization(_) => "Data serialization error".to_string(),
                _ => "An internal error occurred".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
