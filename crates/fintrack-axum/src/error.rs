//! Rejection responses for the session gate and extractors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fintrack_auth_core::AuthError;
use serde_json::json;

/// Code reported for every envelope failure in opaque mode
pub const BAD_ENVELOPE: &str = "BAD_ENVELOPE";

/// An [`AuthError`] on its way to becoming an HTTP response.
///
/// In opaque mode every envelope-family error collapses to a single
/// `400 BAD_ENVELOPE` so clients cannot tell which step failed.
#[derive(Debug)]
pub struct AuthRejection {
    error: AuthError,
    opaque_envelope: bool,
}

impl AuthRejection {
    #[must_use]
    pub fn new(error: AuthError) -> Self {
        Self {
            error,
            opaque_envelope: false,
        }
    }

    #[must_use]
    pub fn opaque(mut self, opaque: bool) -> Self {
        self.opaque_envelope = opaque;
        self
    }

    pub fn error(&self) -> &AuthError {
        &self.error
    }

    pub fn into_error(self) -> AuthError {
        self.error
    }

    /// Status, code and client-facing message
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        if self.opaque_envelope && self.error.is_envelope_error() {
            return (
                StatusCode::BAD_REQUEST,
                BAD_ENVELOPE,
                "bad request envelope".to_string(),
            );
        }

        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.error.is_server_error() {
            "internal error".to_string()
        } else {
            self.error.to_string()
        };
        (status, self.error.error_code(), message)
    }
}

impl From<AuthError> for AuthRejection {
    fn from(error: AuthError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "Auth processing failed");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}
