//! FinTrack Types - Shared domain types
//!
//! Identity types used across FinTrack crates:
//! - User identifiers
//! - Roles
//! - The authenticated identity handed to request handlers

pub mod error;
pub mod role;
pub mod user;

pub use error::*;
pub use role::*;
pub use user::*;
