//! Auth service - ties together passwords, token issuance, rotation and the gate

use std::sync::Arc;

use fintrack_db::{CreateUser, DbError, TokenRepository, UserRepository};
use fintrack_types::{Identity, Role, UserId};
use serde::Serialize;

use crate::{
    clock::Clock,
    config::AuthConfig,
    gate::SessionGate,
    password::PasswordHasher,
    session::SessionManager,
    token::{TokenPair, TokenSigner},
    AuthError,
};

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Registration and password login
/// - Token pair issuance, rotation and revocation
/// - Access-token verification (the session gate)
pub struct AuthService<U: UserRepository + ?Sized, T: TokenRepository + ?Sized> {
    config: AuthConfig,
    passwords: PasswordHasher,
    sessions: SessionManager<T>,
    gate: SessionGate,
    user_repo: Arc<U>,
}

impl<U: UserRepository + ?Sized, T: TokenRepository + ?Sized> AuthService<U, T> {
    /// Create a new auth service
    ///
    /// # Errors
    /// Returns `Configuration` for a short signing secret or invalid
    /// password parameters.
    pub fn new(
        config: AuthConfig,
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let signer = Arc::new(TokenSigner::new(&config, clock)?);

        Ok(Self {
            passwords: PasswordHasher::new(config.password)?,
            sessions: SessionManager::new(Arc::clone(&signer), token_repo),
            gate: SessionGate::new(signer),
            user_repo,
            config,
        })
    }

    pub fn sessions(&self) -> &SessionManager<T> {
        &self.sessions
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new account with role `user`
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            tracing::debug!("Registration for existing email rejected");
            return Err(AuthError::EmailTaken);
        }

        let hashed = self.passwords.hash_off_thread(password).await?;
        let create = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hashed.hash,
            salt: hashed.salt,
            role: Role::User.as_str().to_string(),
        };

        // A concurrent registration can still win the unique index
        let user = self.user_repo.create(create).await.map_err(|e| match e {
            DbError::Conflict(_) => AuthError::EmailTaken,
            other => other.into(),
        })?;

        tracing::info!(user_id = user.id, "Registered user");
        Ok(user.user_id())
    }

    /// Check a password and issue a token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .passwords
            .verify_off_thread(password, &user.password_hash, &user.salt)
            .await?
        {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.sessions
            .issue(Identity::new(user.user_id(), user.role()))
            .await
    }

    /// Look up the profile of an authenticated caller
    pub async fn user_info(&self, identity: &Identity) -> Result<UserProfile, AuthError> {
        let user = self
            .user_repo
            .find_by_id(identity.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserProfile {
            id: user.user_id(),
            role: user.role(),
            name: user.name,
            email: user.email,
        })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Rotate a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.sessions.rotate(refresh_token).await
    }

    /// End the session identified by `refresh_token` on behalf of `identity`.
    ///
    /// Idempotent for tokens that are already gone; a live record owned by
    /// another user is `IdentityMismatch`.
    pub async fn logout(&self, identity: &Identity, refresh_token: &str) -> Result<(), AuthError> {
        match self.sessions.find_live(refresh_token).await? {
            Some(record) if record.user_id() != identity.user_id => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    "Logout attempted for another user's session"
                );
                Err(AuthError::IdentityMismatch)
            }
            Some(_) => {
                self.sessions.revoke(refresh_token).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// End every session of the caller
    pub async fn logout_all(&self, identity: &Identity) -> Result<u64, AuthError> {
        self.sessions.revoke_all(identity.user_id).await
    }

    /// Verify an `Authorization` header value
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        self.gate.authenticate(authorization)
    }
}

impl<U: UserRepository + ?Sized, T: TokenRepository + ?Sized> std::fmt::Debug
    for AuthService<U, T>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::password::PasswordParams;
    use fintrack_db::{MemoryTokenRepository, MemoryUserRepository};

    type Service = AuthService<MemoryUserRepository, MemoryTokenRepository>;

    fn service() -> Service {
        let config = AuthConfig::new("service-test-secret-with-32-bytes!!").with_password_params(
            PasswordParams {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        );
        AuthService::new(
            config,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryTokenRepository::new()),
            Arc::new(ManualClock::at_timestamp(1_700_000_000)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let user_id = auth.register("Alice", "alice@example.com", "pw1").await.unwrap();

        let pair = auth.login("alice@example.com", "pw1").await.unwrap();
        let identity = auth.authenticate(Some(&pair.access_token)).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::User);

        let profile = auth.user_info(&identity).await.unwrap();
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = service();
        auth.register("Alice", "alice@example.com", "pw1").await.unwrap();
        let result = auth.register("Alice 2", "alice@example.com", "pw2").await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let auth = service();
        auth.register("Alice", "alice@example.com", "pw1").await.unwrap();

        assert!(matches!(
            auth.login("bob@example.com", "pw1").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.login("alice@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_checks_ownership() {
        let auth = service();
        auth.register("Alice", "alice@example.com", "pw").await.unwrap();
        auth.register("Bob", "bob@example.com", "pw").await.unwrap();

        let alice = auth.login("alice@example.com", "pw").await.unwrap();
        let bob = auth.login("bob@example.com", "pw").await.unwrap();
        let bob_identity = auth.authenticate(Some(&bob.access_token)).unwrap();

        let result = auth.logout(&bob_identity, &alice.refresh_token).await;
        assert!(matches!(result, Err(AuthError::IdentityMismatch)));
        assert!(auth.refresh(&alice.refresh_token).await.is_ok());

        auth.logout(&bob_identity, &bob.refresh_token).await.unwrap();
        // Second logout is a no-op
        auth.logout(&bob_identity, &bob.refresh_token).await.unwrap();
        assert!(matches!(
            auth.refresh(&bob.refresh_token).await,
            Err(AuthError::RefreshTokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_logout_all() {
        let auth = service();
        auth.register("Alice", "alice@example.com", "pw").await.unwrap();
        let first = auth.login("alice@example.com", "pw").await.unwrap();
        auth.login("alice@example.com", "pw").await.unwrap();

        let identity = auth.authenticate(Some(&first.access_token)).unwrap();
        assert_eq!(auth.logout_all(&identity).await.unwrap(), 2);
        assert!(auth.refresh(&first.refresh_token).await.is_err());
    }
}
