/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup and confirmation-code token exchange
/// - `catalog`: Categories and genres
/// - `titles`: Titles with ratings
/// - `reviews`: Reviews of a title
/// - `comments`: Comments on a review
/// - `users`: Account administration and the caller's own profile

pub mod auth;
pub mod catalog;
pub mod comments;
pub mod health;
pub mod reviews;
pub mod titles;
pub mod users;
