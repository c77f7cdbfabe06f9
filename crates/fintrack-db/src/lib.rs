//! FinTrack DB - Database abstractions
//!
//! SQLx-based persistence for users and issued token records, plus
//! in-memory implementations of the same repository traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use fintrack_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/fintrack").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use memory::{MemoryTokenRepository, MemoryUserRepository};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
