/// Review model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE reviews (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title_id UUID REFERENCES titles(id) ON DELETE SET NULL,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     score INTEGER NOT NULL DEFAULT 10 CHECK (score BETWEEN 1 AND 10),
///     pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT unique_review UNIQUE (author_id, title_id)
/// );
/// ```
///
/// Reads join `users` so the author's username travels with the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Score used when a review is created without one
pub const DEFAULT_SCORE: i32 = 10;

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
    FROM reviews r
    JOIN users u ON u.id = r.author_id
"#;

/// A review with its author's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,

    /// `None` once the title has been deleted
    pub title_id: Option<Uuid>,

    pub author_id: Uuid,

    /// Author username
    pub author: String,

    pub text: String,

    /// 1 to 10 inclusive
    pub score: i32,

    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub title_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReview {
    pub text: Option<String>,
    pub score: Option<i32>,
}

impl Review {
    /// Inserts a review
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the author already reviewed the title.
    pub async fn create(pool: &PgPool, data: CreateReview) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (title_id, author_id, text, score)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(data.title_id)
        .bind(data.author_id)
        .bind(data.text)
        .bind(data.score)
        .fetch_one(pool)
        .await?;

        tracing::info!(review_id = %id, title_id = %data.title_id, "Review created");

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a review only if it belongs to the given title
    pub async fn find_in_title(
        pool: &PgPool,
        title_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.id = $1 AND r.title_id = $2"
        ))
        .bind(id)
        .bind(title_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether the author already has a review on the title
    pub async fn exists_for_author(
        pool: &PgPool,
        title_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(pool)
        .await
    }

    /// Updates text and/or score; returns `None` if the review is gone
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateReview,
    ) -> Result<Option<Self>, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE reviews
            SET text = COALESCE($2, text),
                score = COALESCE($3, score)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.text)
        .bind(data.score)
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Deletes a review; its comments stay, detached
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a title's reviews, oldest first
    pub async fn list_by_title(
        pool: &PgPool,
        title_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 ORDER BY r.pub_date, r.id LIMIT $2 OFFSET $3"
        ))
        .bind(title_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_title(pool: &PgPool, title_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(pool)
            .await
    }
}
