/// Role-based access predicates
///
/// Every check takes the request principal (`None` when anonymous) and returns
/// `Ok` or an [`AuthzError`] that distinguishes a missing identity (401) from
/// an insufficient role (403).
///
/// | Predicate | Safe methods | Unsafe methods |
/// |---|---|---|
/// | [`admin_or_read_only`] | anyone | admin |
/// | [`admin_only`] | admin | admin |
/// | [`write_only_author_or`] | anyone | author, moderator, admin |
///
/// Superusers pass every admin check.
///
/// # Example
///
/// ```
/// use axum::http::Method;
/// use yamdb_shared::auth::permissions::{admin_or_read_only, AuthzError};
///
/// assert!(admin_or_read_only(&Method::GET, None).is_ok());
/// assert_eq!(admin_or_read_only(&Method::POST, None), Err(AuthzError::Unauthenticated));
/// ```

use axum::http::Method;
use uuid::Uuid;

use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The request carries no credentials
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// The principal lacks the required role or ownership
    #[error("You do not have permission to perform this action")]
    Forbidden,
}

/// GET, HEAD and OPTIONS
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Requires an authenticated principal
pub fn require_authenticated(user: Option<&User>) -> Result<&User, AuthzError> {
    user.ok_or(AuthzError::Unauthenticated)
}

/// Reads open to all; writes require an admin
pub fn admin_or_read_only(method: &Method, user: Option<&User>) -> Result<(), AuthzError> {
    if is_safe_method(method) {
        return Ok(());
    }

    admin_only(user).map(|_| ())
}

/// Every method requires an admin
pub fn admin_only(user: Option<&User>) -> Result<&User, AuthzError> {
    let user = require_authenticated(user)?;

    if !user.is_admin() {
        return Err(AuthzError::Forbidden);
    }

    Ok(user)
}

/// Reads open to all; writes require the resource's author or a moderator
/// or admin
///
/// `author_id` is the resource's author; `None` means it has none left, in
/// which case only moderators and admins may write.
pub fn write_only_author_or(
    method: &Method,
    user: Option<&User>,
    author_id: Option<Uuid>,
) -> Result<(), AuthzError> {
    if is_safe_method(method) {
        return Ok(());
    }

    let user = require_authenticated(user)?;

    if user.is_admin() || user.is_moderator() || author_id == Some(user.id) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: format!("{}-account", role.as_str()),
            email: format!("{}@example.com", role.as_str()),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser: false,
            confirmation_code: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::PATCH));
        assert!(!is_safe_method(&Method::DELETE));
    }

    #[test]
    fn test_admin_or_read_only() {
        let admin = user(UserRole::Admin);
        let moderator = user(UserRole::Moderator);

        assert_eq!(admin_or_read_only(&Method::GET, None), Ok(()));
        assert_eq!(
            admin_or_read_only(&Method::DELETE, None),
            Err(AuthzError::Unauthenticated)
        );
        assert_eq!(
            admin_or_read_only(&Method::POST, Some(&moderator)),
            Err(AuthzError::Forbidden)
        );
        assert_eq!(admin_or_read_only(&Method::POST, Some(&admin)), Ok(()));
    }

    #[test]
    fn test_admin_only_applies_to_reads() {
        let regular = user(UserRole::User);
        let mut superuser = user(UserRole::User);
        superuser.is_superuser = true;

        assert_eq!(admin_only(None).err(), Some(AuthzError::Unauthenticated));
        assert_eq!(admin_only(Some(&regular)).err(), Some(AuthzError::Forbidden));
        assert!(admin_only(Some(&superuser)).is_ok());
    }

    #[test]
    fn test_write_only_author_or() {
        let author = user(UserRole::User);
        let stranger = user(UserRole::User);
        let moderator = user(UserRole::Moderator);
        let admin = user(UserRole::Admin);

        assert_eq!(write_only_author_or(&Method::GET, None, Some(author.id)), Ok(()));
        assert_eq!(
            write_only_author_or(&Method::PATCH, None, Some(author.id)),
            Err(AuthzError::Unauthenticated)
        );
        assert_eq!(
            write_only_author_or(&Method::PATCH, Some(&author), Some(author.id)),
            Ok(())
        );
        assert_eq!(
            write_only_author_or(&Method::DELETE, Some(&stranger), Some(author.id)),
            Err(AuthzError::Forbidden)
        );
        assert_eq!(
            write_only_author_or(&Method::DELETE, Some(&moderator), Some(author.id)),
            Ok(())
        );
        assert_eq!(
            write_only_author_or(&Method::PATCH, Some(&admin), Some(author.id)),
            Ok(())
        );
    }

    #[test]
    fn test_orphaned_resource_needs_staff() {
        let regular = user(UserRole::User);
        let moderator = user(UserRole::Moderator);

        assert_eq!(
            write_only_author_or(&Method::PATCH, Some(&regular), None),
            Err(AuthzError::Forbidden)
        );
        assert_eq!(write_only_author_or(&Method::PATCH, Some(&moderator), None), Ok(()));
    }
}
