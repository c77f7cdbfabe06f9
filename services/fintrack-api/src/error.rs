//! Error types for the FinTrack API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fintrack_auth_core::AuthError;
use fintrack_axum::AuthRejection;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// A required request field was empty
    pub fn missing_field(field: &str) -> Self {
        Self::BadRequest(format!("{field} is required"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Same body shape and codes as the gate and envelope rejections
            Self::Auth(error) => AuthRejection::new(error).into_response(),
            Self::BadRequest(_) => {
                let body = ErrorResponse {
                    error: ErrorDetail {
                        code: "BAD_REQUEST".to_string(),
                        message: self.to_string(),
                    },
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
