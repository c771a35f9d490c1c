//! In-memory repositories - used when no database is configured, and in tests.

mod repository;

pub use repository::{InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};
