/// Category and genre models
///
/// Both taxonomies share one shape (`name` + unique `slug`) and differ only
/// in their table, so a single [`CatalogEntry`] type serves both, selected by
/// [`CatalogKind`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (                -- and identically: genres
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(256) NOT NULL,
///     slug VARCHAR(50) NOT NULL UNIQUE
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::like_pattern;

/// Which catalog table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Category,
    Genre,
}

impl CatalogKind {
    fn table(&self) -> &'static str {
        match self {
            CatalogKind::Category => "categories",
            CatalogKind::Genre => "genres",
        }
    }

    /// Singular name used in messages
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::Genre => "genre",
        }
    }
}

/// A category or genre row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Input for creating a category or genre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCatalogEntry {
    pub name: String,
    pub slug: String,
}

impl CatalogEntry {
    /// Inserts an entry
    ///
    /// # Errors
    ///
    /// Fails on a duplicate slug (unique constraint violation).
    pub async fn create(
        pool: &PgPool,
        kind: CatalogKind,
        data: CreateCatalogEntry,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CatalogEntry>(&format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            kind.table()
        ))
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CatalogEntry>(&format!(
            "SELECT id, name, slug FROM {} WHERE slug = $1",
            kind.table()
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Fetches every entry whose slug is in `slugs`
    ///
    /// Unknown slugs are simply absent from the result; callers compare
    /// lengths to detect them.
    pub async fn find_by_slugs(
        pool: &PgPool,
        kind: CatalogKind,
        slugs: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, CatalogEntry>(&format!(
            "SELECT id, name, slug FROM {} WHERE slug = ANY($1) ORDER BY name",
            kind.table()
        ))
        .bind(slugs)
        .fetch_all(pool)
        .await
    }

    /// Deletes by slug
    ///
    /// Deleting a genre unlinks it from titles. Deleting a category that
    /// titles still reference fails with a foreign key violation.
    pub async fn delete_by_slug(
        pool: &PgPool,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = $1", kind.table()))
            .bind(slug)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists entries ordered by name, optionally filtered by a
    /// case-insensitive name substring
    pub async fn list(
        pool: &PgPool,
        kind: CatalogKind,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CatalogEntry>(&format!(
            r#"
            SELECT id, name, slug
            FROM {}
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
            ORDER BY name, slug
            LIMIT $2 OFFSET $3
            "#,
            kind.table()
        ))
        .bind(search.map(like_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(
        pool: &PgPool,
        kind: CatalogKind,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
            kind.table()
        ))
        .bind(search.map(like_pattern))
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tables() {
        assert_eq!(CatalogKind::Category.table(), "categories");
        assert_eq!(CatalogKind::Genre.table(), "genres");
        assert_eq!(CatalogKind::Genre.label(), "genre");
    }
}
