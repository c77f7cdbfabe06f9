//! Common test utilities for fintrack-auth-core integration tests

#![allow(dead_code)]

use std::sync::Arc;

use fintrack_auth_core::{
    AuthConfig, AuthService, EnvelopeConfig, EnvelopeOpener, ManualClock, PasswordParams,
    PrivateKey,
};
use fintrack_db::{MemoryTokenRepository, MemoryUserRepository};

pub const PKCS8_PEM: &str = include_str!("../fixtures/private_pkcs8.pem");
pub const PKCS1_PEM: &str = include_str!("../fixtures/private_pkcs1.pem");

/// Fixed "now" for clock-driven tests
pub const NOW: i64 = 1_700_000_000;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub fn fixture_key() -> PrivateKey {
    PrivateKey::from_pem(PKCS8_PEM).expect("fixture key parses")
}

pub fn opener_at(now: i64) -> EnvelopeOpener {
    EnvelopeOpener::new(
        fixture_key(),
        EnvelopeConfig::default(),
        Arc::new(ManualClock::at_timestamp(now)),
    )
}

/// Cheap Argon2 parameters so tests do not allocate 64 MiB per hash
pub fn light_password_params() -> PasswordParams {
    PasswordParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub struct TestAuth {
    pub service: AuthService<MemoryUserRepository, MemoryTokenRepository>,
    pub tokens: Arc<MemoryTokenRepository>,
    pub clock: Arc<ManualClock>,
}

pub fn test_auth() -> TestAuth {
    let clock = Arc::new(ManualClock::at_timestamp(NOW));
    let tokens = Arc::new(MemoryTokenRepository::new());
    let config = AuthConfig::new(TEST_SECRET).with_password_params(light_password_params());
    let service = AuthService::new(
        config,
        Arc::new(MemoryUserRepository::new()),
        Arc::clone(&tokens),
        clock.clone(),
    )
    .expect("valid test config");

    TestAuth {
        service,
        tokens,
        clock,
    }
}
