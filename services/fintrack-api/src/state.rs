//! Application state

use std::sync::Arc;

use axum::extract::FromRef;
use fintrack_auth_core::{AuthService, Clock, EnvelopeOpener, PrivateKey};
use fintrack_db::{
    DbPool, MemoryTokenRepository, MemoryUserRepository, Repositories, TokenRepository,
    UserRepository,
};

use crate::config::Config;

/// Auth service over whichever storage backend was configured
pub type AuthServiceImpl = AuthService<dyn UserRepository, dyn TokenRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and session management
    pub auth: Arc<AuthServiceImpl>,
    /// Opens sealed request bodies
    pub opener: Arc<EnvelopeOpener>,
    /// Database connection pool (absent with in-memory storage)
    pub pool: Option<DbPool>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create state backed by PostgreSQL
    pub fn postgres(
        config: Config,
        key: PrivateKey,
        pool: DbPool,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, fintrack_auth_core::AuthError> {
        let repos = Repositories::new(pool.clone());
        Self::build(
            config,
            key,
            Arc::new(repos.users),
            Arc::new(repos.tokens),
            Some(pool),
            clock,
        )
    }

    /// Create state backed by process-local maps
    pub fn in_memory(
        config: Config,
        key: PrivateKey,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, fintrack_auth_core::AuthError> {
        Self::build(
            config,
            key,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryTokenRepository::new()),
            None,
            clock,
        )
    }

    fn build(
        config: Config,
        key: PrivateKey,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        pool: Option<DbPool>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, fintrack_auth_core::AuthError> {
        let auth = AuthService::new(config.auth.clone(), users, tokens, Arc::clone(&clock))?;
        let opener = EnvelopeOpener::new(key, config.envelope.clone(), clock);

        Ok(Self {
            auth: Arc::new(auth),
            opener: Arc::new(opener),
            pool,
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for Arc<EnvelopeOpener> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.opener)
    }
}
