//! # TaskHive Shared Library
//!
//! This crate contains shared types, persistence, and business logic used by
//! the TaskHive API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Identity verification, session tokens, and authorization policy
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskHive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
