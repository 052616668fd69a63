//! # YaMDb API Server Library
//!
//! HTTP surface of the YaMDb review service: titles grouped by category and
//! genre, user reviews with scores, comments, and accounts that sign in with
//! emailed confirmation codes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with API errors
//! - `pagination`: Page-number and limit/offset list envelopes
//! - `routes`: API route handlers
//! - `validation`: Domain field checks

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod routes;
pub mod validation;
