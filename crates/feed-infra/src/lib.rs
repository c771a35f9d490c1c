//! # Feed Infrastructure
//!
//! Concrete implementations of the ports defined in `feed-core`.
//! This crate contains the database, in-memory, image storage and
//! authentication adapters.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM
//! - `minimal` - No database driver, in-memory repositories only

pub mod auth;
pub mod database;
pub mod memory;
pub mod storage;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::DatabaseConfig;
pub use memory::{InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};
pub use storage::LocalImageStore;

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};
