//! # YaMDb Shared Library
//!
//! Storage, authentication and mail plumbing shared by the YaMDb API server
//! and its integration tests.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migration runner
//! - `models`: Database models and their CRUD operations
//! - `auth`: Tokens, confirmation codes, request authentication, permissions
//! - `mail`: Outbound email channel

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the YaMDb shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
