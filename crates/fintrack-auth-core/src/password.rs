//! Argon2id password hashing
//!
//! Stored form: unpadded standard base64 of the raw 32-byte hash, salt in a
//! separate column encoded the same way. The cost parameters are not stored,
//! so changing them invalidates existing hashes.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use rand::RngCore;

use crate::crypto::constant_time_eq;
use crate::AuthError;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Hash output length in bytes
pub const HASH_LEN: usize = 32;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 1,
            parallelism: 4,
        }
    }
}

/// A freshly hashed password ready to be stored
#[derive(Debug, Clone)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Argon2id hasher with fixed cost parameters
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(params: PasswordParams) -> Result<Self, AuthError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(HASH_LEN),
        )
        .map_err(|e| AuthError::Configuration(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Hash with a new random salt
    pub fn hash(&self, password: &str) -> Result<HashedPassword, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let raw = self.derive(password, &salt)?;
        Ok(HashedPassword {
            hash: STANDARD_NO_PAD.encode(raw),
            salt: STANDARD_NO_PAD.encode(salt),
        })
    }

    /// Compare `password` against a stored hash and salt
    pub fn verify(&self, password: &str, hash: &str, salt: &str) -> Result<bool, AuthError> {
        let salt = STANDARD_NO_PAD.decode(salt).map_err(|_| {
            tracing::error!("Stored password salt is not valid base64");
            AuthError::Internal("corrupt password record".to_string())
        })?;
        let expected = STANDARD_NO_PAD.decode(hash).map_err(|_| {
            tracing::error!("Stored password hash is not valid base64");
            AuthError::Internal("corrupt password record".to_string())
        })?;

        let actual = self.derive(password, &salt)?;
        Ok(constant_time_eq(&actual, &expected))
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_off_thread(&self, password: &str) -> Result<HashedPassword, AuthError> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {e}")))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_off_thread(
        &self,
        password: &str,
        hash: &str,
        salt: &str,
    ) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let (password, hash, salt) = (password.to_string(), hash.to_string(), salt.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash, &salt))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {e}")))?
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], AuthError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = [0u8; HASH_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut out)
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))?;
        Ok(out)
    }
}
