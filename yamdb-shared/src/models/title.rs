/// Title model and database operations
///
/// A title is a catalogued work. It belongs to exactly one category and is
/// linked to any number of genres through `genre_titles`. Its rating is never
/// stored: it is the mean of its review scores, computed on read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE titles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(250) NOT NULL,
///     year INTEGER CHECK (year >= 0),
///     description TEXT,
///     category_id UUID NOT NULL REFERENCES categories(id) ON DELETE RESTRICT
/// );
///
/// CREATE TABLE genre_titles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title_id UUID NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
///     genre_id UUID NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
///     CONSTRAINT unique_genre_title UNIQUE (title_id, genre_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use yamdb_shared::models::title::{Title, TitleFilter};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let filter = TitleFilter { year: Some(1994), ..Default::default() };
/// for title in Title::list_details(&pool, &filter, 10, 0).await? {
///     println!("{} rated {:?}", title.name, title.rating);
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{catalog::CatalogEntry, like_pattern};

/// A `titles` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Title {
    pub id: Uuid,
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Uuid,
}

/// A title with its category, genres and computed rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetail {
    pub id: Uuid,
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: CatalogEntry,
    pub genres: Vec<CatalogEntry>,

    /// Mean review score; `None` without reviews
    pub rating: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct TitleDetailRow {
    id: Uuid,
    name: String,
    year: Option<i32>,
    description: Option<String>,
    category_id: Uuid,
    category_name: String,
    category_slug: String,
    rating: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct TitleGenreRow {
    title_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

/// List filters; `None` fields don't constrain the result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,

    /// Exact release year
    pub year: Option<i32>,

    /// Category slug
    pub category: Option<String>,

    /// Slug of one of the title's genres
    pub genre: Option<String>,
}

/// Input for creating a title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTitle {
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub genre_ids: Vec<Uuid>,
}

/// Input for updating a title
///
/// `Some(None)` clears a nullable column. `genre_ids`, when present,
/// replaces the whole genre set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTitle {
    pub name: Option<String>,
    pub year: Option<Option<i32>>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub genre_ids: Option<Vec<Uuid>>,
}

const DETAIL_SELECT: &str = r#"
    SELECT t.id, t.name, t.year, t.description, t.category_id,
           c.name AS category_name, c.slug AS category_slug,
           AVG(r.score)::FLOAT8 AS rating
    FROM titles t
    JOIN categories c ON c.id = t.category_id
    LEFT JOIN reviews r ON r.title_id = t.id
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR t.name ILIKE $1)
      AND ($2::INTEGER IS NULL OR t.year = $2)
      AND ($3::TEXT IS NULL OR c.slug = $3)
      AND ($4::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM genre_titles gt
            JOIN genres g ON g.id = gt.genre_id
            WHERE gt.title_id = t.id AND g.slug = $4))
"#;

impl Title {
    /// Inserts a title and its genre links in one transaction
    pub async fn create(pool: &PgPool, data: CreateTitle) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let title = sqlx::query_as::<_, Title>(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, year, description, category_id
            "#,
        )
        .bind(data.name)
        .bind(data.year)
        .bind(data.description)
        .bind(data.category_id)
        .fetch_one(&mut *tx)
        .await?;

        link_genres(&mut tx, title.id, &data.genre_ids).await?;
        tx.commit().await?;

        tracing::info!(title_id = %title.id, "Title created");
        Ok(title)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Title>(
            "SELECT id, name, year, description, category_id FROM titles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a title; returns `None` if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTitle,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut assignments = Vec::new();
        let mut bind_count = 1;
        for (column, present) in [
            ("name", data.name.is_some()),
            ("year", data.year.is_some()),
            ("description", data.description.is_some()),
            ("category_id", data.category_id.is_some()),
        ] {
            if present {
                bind_count += 1;
                assignments.push(format!("{column} = ${bind_count}"));
            }
        }

        // An empty SET list still locks and returns the row
        let set_clause = if assignments.is_empty() {
            "name = name".to_string()
        } else {
            assignments.join(", ")
        };
        let query = format!(
            "UPDATE titles SET {set_clause} WHERE id = $1 \
             RETURNING id, name, year, description, category_id"
        );

        let mut q = sqlx::query_as::<_, Title>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(year) = data.year {
            q = q.bind(year);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }

        let Some(title) = q.fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        if let Some(genre_ids) = data.genre_ids {
            sqlx::query("DELETE FROM genre_titles WHERE title_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_genres(&mut tx, id, &genre_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(title))
    }

    /// Deletes a title; its reviews stay, detached from any title
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Loads one title with category, genres and rating
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TitleDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, TitleDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE t.id = $1 GROUP BY t.id, c.id"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let details = attach_genres(pool, vec![row]).await?;
        Ok(details.into_iter().next())
    }

    /// Lists titles ordered by name with category, genres and rating
    pub async fn list_details(
        pool: &PgPool,
        filter: &TitleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TitleDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TitleDetailRow>(&format!(
            "{DETAIL_SELECT} {FILTER_CLAUSE} GROUP BY t.id, c.id ORDER BY t.name, t.id LIMIT $5 OFFSET $6"
        ))
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.year)
        .bind(filter.category.as_deref())
        .bind(filter.genre.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        attach_genres(pool, rows).await
    }

    /// Counts titles matching the same filter as [`Title::list_details`]
    pub async fn count(pool: &PgPool, filter: &TitleFilter) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM titles t JOIN categories c ON c.id = t.category_id {FILTER_CLAUSE}"
        ))
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.year)
        .bind(filter.category.as_deref())
        .bind(filter.genre.as_deref())
        .fetch_one(pool)
        .await
    }
}

async fn link_genres(
    tx: &mut Transaction<'_, Postgres>,
    title_id: Uuid,
    genre_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    if genre_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO genre_titles (title_id, genre_id)
        SELECT $1, genre_id FROM UNNEST($2::UUID[]) AS genre_id
        ON CONFLICT (title_id, genre_id) DO NOTHING
        "#,
    )
    .bind(title_id)
    .bind(genre_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn attach_genres(
    pool: &PgPool,
    rows: Vec<TitleDetailRow>,
) -> Result<Vec<TitleDetail>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let genre_rows = sqlx::query_as::<_, TitleGenreRow>(
        r#"
        SELECT gt.title_id, g.id, g.name, g.slug
        FROM genre_titles gt
        JOIN genres g ON g.id = gt.genre_id
        WHERE gt.title_id = ANY($1)
        ORDER BY g.name, g.slug
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(assemble_details(rows, genre_rows))
}

fn assemble_details(rows: Vec<TitleDetailRow>, genre_rows: Vec<TitleGenreRow>) -> Vec<TitleDetail> {
    let mut genres: HashMap<Uuid, Vec<CatalogEntry>> = HashMap::new();
    for g in genre_rows {
        genres.entry(g.title_id).or_default().push(CatalogEntry {
            id: g.id,
            name: g.name,
            slug: g.slug,
        });
    }

    rows.into_iter()
        .map(|row| TitleDetail {
            genres: genres.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            year: row.year,
            description: row.description,
            category: CatalogEntry {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            rating: row.rating,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid, name: &str, rating: Option<f64>) -> TitleDetailRow {
        TitleDetailRow {
            id,
            name: name.to_string(),
            year: Some(2020),
            description: None,
            category_id: Uuid::new_v4(),
            category_name: "Movie".to_string(),
            category_slug: "movie".to_string(),
            rating,
        }
    }

    #[test]
    fn test_assemble_groups_genres_per_title() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let genre = |title_id, slug: &str| TitleGenreRow {
            title_id,
            id: Uuid::new_v4(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
        };

        let details = assemble_details(
            vec![row(a, "Alien", Some(7.5)), row(b, "Brazil", None)],
            vec![genre(a, "horror"), genre(a, "sci-fi"), genre(b, "comedy")],
        );

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].name, "Alien");
        let slugs: Vec<&str> = details[0].genres.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, ["horror", "sci-fi"]);
        assert_eq!(details[0].rating, Some(7.5));
        assert_eq!(details[1].genres.len(), 1);
        assert_eq!(details[1].rating, None);
        assert_eq!(details[1].category.slug, "movie");
    }

    #[test]
    fn test_assemble_title_without_genres() {
        let id = Uuid::new_v4();
        let details = assemble_details(vec![row(id, "Solo", None)], vec![]);
        assert!(details[0].genres.is_empty());
    }
}
