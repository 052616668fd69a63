/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`jwt`]: access token issuance and validation
/// - [`confirmation`]: confirmation code generation and verification
/// - [`middleware`]: per-request principal resolution for Axum
/// - [`permissions`]: role-based access predicates
///
/// # Example
///
/// ```no_run
/// use yamdb_shared::auth::confirmation::generate_code;
/// use yamdb_shared::auth::jwt::{create_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (code, _digest) = generate_code();
/// let token = create_token(
///     &Claims::for_user(Uuid::new_v4(), Duration::hours(24)),
///     "an-hs256-secret-of-at-least-32-bytes!",
/// )?;
/// # Ok(())
/// # }
/// ```

pub mod confirmation;
pub mod jwt;
pub mod middleware;
pub mod permissions;
