//! # Feed Core
//!
//! The domain layer of the feed backend: posts, their owners, and the
//! use-cases that keep the two consistent.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use services::PostService;
