/// Domain checks the validator derive can't express
///
/// Each check returns a field-level [`ApiError::ValidationError`], so it
/// renders exactly like derive-validation failures.

use chrono::{Datelike, Utc};

use crate::error::{ApiError, ApiResult};

/// Username that would shadow `/users/me/`
pub const RESERVED_USERNAME: &str = "me";

/// Letters, digits and `@ . + - _`, not the reserved name
pub fn check_username(field: &str, username: &str) -> ApiResult<()> {
    if username == RESERVED_USERNAME {
        return Err(ApiError::field(
            field,
            format!("Username \"{}\" is reserved", RESERVED_USERNAME),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ApiError::field(
            field,
            "Username may contain only letters, digits and @/./+/-/_ characters",
        ));
    }

    Ok(())
}

/// ASCII letters, digits, `-` and `_`
pub fn check_slug(field: &str, slug: &str) -> ApiResult<()> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::field(
            field,
            "Slug may contain only letters, numbers, underscores or hyphens",
        ));
    }

    Ok(())
}

/// Not negative, not after the current year
pub fn check_year(field: &str, year: i32) -> ApiResult<()> {
    if year < 0 {
        return Err(ApiError::field(field, "Year must not be negative"));
    }

    if year > Utc::now().year() {
        return Err(ApiError::field(
            field,
            "Cannot add a title that has not been released yet",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_username() {
        let err = check_username("username", "me").unwrap_err();
        match err {
            ApiError::ValidationError(details) => assert_eq!(details[0].field, "username"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(check_username("username", "me2").is_ok());
        assert!(check_username("username", "Me").is_ok());
    }

    #[test]
    fn test_username_charset() {
        assert!(check_username("username", "john.doe+test@x_y-z").is_ok());
        assert!(check_username("username", "ёжик").is_ok());
        assert!(check_username("username", "with space").is_err());
        assert!(check_username("username", "semi;colon").is_err());
    }

    #[test]
    fn test_slug_charset() {
        assert!(check_slug("slug", "sci-fi_2").is_ok());
        assert!(check_slug("slug", "").is_err());
        assert!(check_slug("slug", "sci fi").is_err());
        assert!(check_slug("slug", "фантастика").is_err());
    }

    #[test]
    fn test_year_bounds() {
        let current = Utc::now().year();
        assert!(check_year("year", current).is_ok());
        assert!(check_year("year", 1895).is_ok());
        assert!(check_year("year", current + 1).is_err());
        assert!(check_year("year", -1).is_err());
    }
}
