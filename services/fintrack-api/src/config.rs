//! Configuration for the FinTrack API service.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fintrack_auth_core::{AuthConfig, EnvelopeConfig, SigningSecret};

/// Where users and token records live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl FromStr for Storage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORAGE")),
        }
    }
}

/// FinTrack API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Storage backend
    pub storage: Storage,

    /// Database URL (required for Postgres storage)
    pub database_url: Option<String>,

    /// PEM file holding the envelope private key
    pub private_key_path: PathBuf,

    /// Token issuance configuration
    pub auth: AuthConfig,

    /// Envelope replay window and error reporting
    pub envelope: EnvelopeConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage: Storage = lookup("STORAGE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if storage == Storage::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let http_port = parse_or(&lookup, "HTTP_PORT", 9090u16)?;

        // Signing secret (minimum 32 bytes)
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < SigningSecret::MIN_KEY_LENGTH {
            return Err(ConfigError::Invalid(
                "JWT_SECRET must be at least 32 bytes",
            ));
        }

        let access_ttl_secs = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", 7200u64)?;
        let refresh_ttl_secs = parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", 604_800u64)?;
        if access_ttl_secs == 0 {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECS"));
        }
        if refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("REFRESH_TOKEN_TTL_SECS"));
        }

        let private_key_path = lookup("RSA_PRIVATE_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./private.pem"));

        let replay_window_secs = parse_or(&lookup, "ENVELOPE_REPLAY_WINDOW_SECS", 60u64)?;
        let opaque_errors = parse_or(&lookup, "OPAQUE_ENVELOPE_ERRORS", false)?;

        let auth = AuthConfig::new(jwt_secret)
            .with_access_token_ttl(Duration::from_secs(access_ttl_secs))
            .with_refresh_token_ttl(Duration::from_secs(refresh_ttl_secs));

        let envelope = EnvelopeConfig::default()
            .with_replay_window(Duration::from_secs(replay_window_secs))
            .with_opaque_errors(opaque_errors);

        Ok(Self {
            http_port,
            storage,
            database_url,
            private_key_path,
            auth,
            envelope,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
