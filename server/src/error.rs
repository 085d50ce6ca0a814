use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tts_client::SynthesisError;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing ?text= parameter")]
    MissingInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("{0}")]
    Filesystem(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Synthesis(_) | ApiError::Filesystem(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ApiError::InvalidInput(msg) => msg,
            ApiError::Synthesis(e) => {
                tracing::error!("Synthesis error: {}", e);
                e.to_string()
            }
            ApiError::Filesystem(msg) => {
                tracing::error!("Filesystem error: {}", msg);
                msg
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
