//! PostgreSQL repository implementations

mod token;
mod user;

pub use token::PgTokenRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub tokens: PgTokenRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            tokens: PgTokenRepository::new(pool),
        }
    }
}
