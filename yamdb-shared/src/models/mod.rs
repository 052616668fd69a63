/// Database models for YaMDb
///
/// Each model owns its table and exposes async CRUD operations taking a
/// `PgPool`.
///
/// # Models
///
/// - `user`: Accounts, roles and confirmation codes
/// - `catalog`: Categories and genres (slug-keyed taxonomies)
/// - `title`: Catalogued works, their genre links and derived rating
/// - `review`: Scored reviews, one per author per title
/// - `comment`: Comments on reviews

pub mod catalog;
pub mod comment;
pub mod review;
pub mod title;
pub mod user;

/// Turns a search term into an `ILIKE` substring pattern
///
/// `%`, `_` and `\` in the term match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("dune"), "%dune%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
