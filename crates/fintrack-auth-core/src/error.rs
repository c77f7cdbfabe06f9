//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// Grouped into three families that clients can act on differently:
/// envelope failures (re-seal the request and retry), token failures
/// (log in again) and session-gate failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Envelope timestamp is outside the replay window
    #[error("envelope timestamp outside replay window")]
    StaleTimestamp,

    /// `enc_payload` could not be decoded or decrypted to 48 bytes
    #[error("failed to recover envelope key material")]
    KeyRecoveryFailed,

    /// Recovered key or IV is not base64 of exactly 16 bytes
    #[error("invalid envelope key material")]
    InvalidKeyMaterial,

    /// `en_data` is not base64 or not a whole number of cipher blocks
    #[error("malformed envelope ciphertext")]
    MalformedCiphertext,

    /// Decrypted plaintext carries an invalid pad length
    #[error("invalid envelope padding")]
    InvalidPadding,

    /// `sign` does not match the recovered key material and timestamp
    #[error("envelope signature mismatch")]
    SignatureMismatch,

    /// Plaintext is not a valid document of the requested shape
    #[error("failed to decode payload: {0}")]
    PayloadDecodeError(String),

    /// Invalid token (malformed, bad signature, expired, wrong kind)
    #[error("invalid token")]
    InvalidToken,

    /// Refresh token has no live record (rotated, revoked or expired)
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// No credential was presented
    #[error("missing credential")]
    MissingCredential,

    /// Credential is valid but does not grant this operation
    #[error("identity mismatch")]
    IdentityMismatch,

    /// Invalid credentials (wrong password)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email address already registered
    #[error("email already registered")]
    EmailTaken,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::StaleTimestamp
            | Self::KeyRecoveryFailed
            | Self::InvalidKeyMaterial
            | Self::MalformedCiphertext
            | Self::InvalidPadding
            | Self::SignatureMismatch
            | Self::PayloadDecodeError(_) => 400,
            Self::InvalidToken
            | Self::RefreshTokenExpired
            | Self::MissingCredential
            | Self::InvalidCredentials => 401,
            Self::IdentityMismatch => 403,
            Self::UserNotFound => 404,
            Self::EmailTaken => 409,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StaleTimestamp => "STALE_TIMESTAMP",
            Self::KeyRecoveryFailed => "KEY_RECOVERY_FAILED",
            Self::InvalidKeyMaterial => "INVALID_KEY_MATERIAL",
            Self::MalformedCiphertext => "MALFORMED_CIPHERTEXT",
            Self::InvalidPadding => "INVALID_PADDING",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::PayloadDecodeError(_) => "PAYLOAD_DECODE_ERROR",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the client should re-seal the request and retry
    pub fn is_envelope_error(&self) -> bool {
        matches!(
            self,
            Self::StaleTimestamp
                | Self::KeyRecoveryFailed
                | Self::InvalidKeyMaterial
                | Self::MalformedCiphertext
                | Self::InvalidPadding
                | Self::SignatureMismatch
                | Self::PayloadDecodeError(_)
        )
    }

    /// Whether the client must authenticate again
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::RefreshTokenExpired | Self::MissingCredential
        )
    }

    /// Whether the error is caused by the server rather than the request
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<fintrack_db::DbError> for AuthError {
    fn from(err: fintrack_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
