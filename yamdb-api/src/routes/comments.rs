/// Comment endpoints
///
/// Nested under a review, which must belong to the title in the path.
///
/// # Endpoints
///
/// - `GET /v1/titles/:title_id/reviews/:review_id/comments/` - List (limit/offset)
/// - `POST /v1/titles/:title_id/reviews/:review_id/comments/` - Create
/// - `GET`, `PATCH`, `PUT`, `DELETE .../comments/:comment_id/`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::{LimitOffset, LimitOffsetParams, Page},
};
use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;
use yamdb_shared::{
    auth::{
        middleware::AuthContext,
        permissions::{require_authenticated, write_only_author_or},
    },
    models::{
        comment::{Comment, CreateComment},
        review::Review,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub review: Option<Uuid>,
    pub text: String,

    /// Author username; `null` once the account is gone
    pub author: Option<String>,
    pub pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            review: comment.review_id,
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub text: Option<String>,
}

impl CommentRequest {
    fn check(&self, partial: bool) -> ApiResult<()> {
        self.validate()?;

        if !partial && self.text.is_none() {
            return Err(ApiError::field("text", "This field is required"));
        }

        Ok(())
    }
}

async fn ensure_review(pool: &PgPool, title_id: Uuid, review_id: Uuid) -> ApiResult<Review> {
    Review::find_in_title(pool, title_id, review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))
}

async fn load_comment(
    pool: &PgPool,
    (title_id, review_id, comment_id): (Uuid, Uuid, Uuid),
) -> ApiResult<Comment> {
    ensure_review(pool, title_id, review_id).await?;

    Comment::find_in_review(pool, review_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
}

pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiPath((title_id, review_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(params): ApiQuery<LimitOffsetParams>,
) -> ApiResult<Json<Page<CommentResponse>>> {
    ensure_review(&state.db, title_id, review_id).await?;

    let window = LimitOffset::from_params(&params);
    let count = Comment::count_by_review(&state.db, review_id).await?;
    let comments =
        Comment::list_by_review(&state.db, review_id, window.limit(), window.offset()).await?;

    Ok(Json(window.page(&uri, count, comments).map(CommentResponse::from)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((title_id, review_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let user = require_authenticated(auth.user())?;
    let review = ensure_review(&state.db, title_id, review_id).await?;
    req.check(false)?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            review_id: review.id,
            author_id: user.id,
            text: req.text.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn get_comment(
    State(state): State<AppState>,
    ApiPath(ids): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<CommentResponse>> {
    Ok(Json(load_comment(&state.db, ids).await?.into()))
}

async fn update_comment(
    state: AppState,
    auth: AuthContext,
    method: Method,
    ids: (Uuid, Uuid, Uuid),
    req: CommentRequest,
    partial: bool,
) -> ApiResult<Json<CommentResponse>> {
    require_authenticated(auth.user())?;
    let comment = load_comment(&state.db, ids).await?;
    write_only_author_or(&method, auth.user(), comment.author_id)?;

    req.check(partial)?;

    // `text` is the only writable field
    let Some(text) = req.text else {
        return Ok(Json(comment.into()));
    };

    let updated = Comment::update_text(&state.db, comment.id, text)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(updated.into()))
}

pub async fn patch_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(ids): ApiPath<(Uuid, Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    update_comment(state, auth, method, ids, req, true).await
}

pub async fn put_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(ids): ApiPath<(Uuid, Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    update_comment(state, auth, method, ids, req, false).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(ids): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_authenticated(auth.user())?;
    let comment = load_comment(&state.db, ids).await?;
    write_only_author_or(&method, auth.user(), comment.author_id)?;

    Comment::delete(&state.db, comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rules() {
        let empty = CommentRequest::default();
        assert!(empty.check(false).is_err());
        assert!(empty.check(true).is_ok());

        let blank = CommentRequest {
            text: Some(String::new()),
        };
        assert!(blank.check(true).is_err());
    }

    #[test]
    fn test_orphaned_comment_serializes_null_author() {
        let response = CommentResponse::from(Comment {
            id: Uuid::new_v4(),
            review_id: None,
            author_id: None,
            author: None,
            text: "still here".into(),
            pub_date: Utc::now(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["author"].is_null());
        assert!(json["review"].is_null());
    }
}
