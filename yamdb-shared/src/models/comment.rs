/// Comment model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     review_id UUID REFERENCES reviews(id) ON DELETE SET NULL,
///     author_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     text TEXT NOT NULL,
///     pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
    FROM comments c
    LEFT JOIN users u ON u.id = c.author_id
"#;

/// A comment with its author's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub review_id: Option<Uuid>,

    /// `None` once the author account is deleted
    pub author_id: Option<Uuid>,
    pub author: Option<String>,

    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub review_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

impl Comment {
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO comments (review_id, author_id, text) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(data.review_id)
        .bind(data.author_id)
        .bind(data.text)
        .fetch_one(pool)
        .await?;

        tracing::debug!(comment_id = %id, review_id = %data.review_id, "Comment created");

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a comment only if it belongs to the given review
    pub async fn find_in_review(
        pool: &PgPool,
        review_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.id = $1 AND c.review_id = $2"
        ))
        .bind(id)
        .bind(review_id)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the text; returns `None` if the comment is gone
    pub async fn update_text(
        pool: &PgPool,
        id: Uuid,
        text: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let updated = sqlx::query("UPDATE comments SET text = $2 WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a review's comments, oldest first
    pub async fn list_by_review(
        pool: &PgPool,
        review_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = $1 ORDER BY c.pub_date, c.id LIMIT $2 OFFSET $3"
        ))
        .bind(review_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_review(pool: &PgPool, review_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(pool)
            .await
    }
}
