//! Request extractors and the error boundary.

pub mod auth;
pub mod error;
