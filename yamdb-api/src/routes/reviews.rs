/// Review endpoints
///
/// Anyone may read. Any authenticated user may post one review per title;
/// edits and deletion are open to the author, moderators and admins.
///
/// # Endpoints
///
/// - `GET /v1/titles/:title_id/reviews/` - List (limit/offset)
/// - `POST /v1/titles/:title_id/reviews/` - Create
/// - `GET /v1/titles/:title_id/reviews/:review_id/` - Retrieve
/// - `PATCH`, `PUT`, `DELETE /v1/titles/:title_id/reviews/:review_id/`

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
        review::{CreateReview, Review, UpdateReview, DEFAULT_SCORE},
        title::Title,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub text: String,

    /// Author username
    pub author: String,
    pub pub_date: DateTime<Utc>,
    pub score: i32,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            text: review.text,
            author: review.author,
            pub_date: review.pub_date,
            score: review.score,
        }
    }
}

/// Create/update body; `author` and `pub_date` are never taken from input
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: Option<i32>,
}

impl ReviewRequest {
    fn check(&self, partial: bool) -> ApiResult<()> {
        self.validate()?;

        if !partial && self.text.is_none() {
            return Err(ApiError::field("text", "This field is required"));
        }

        Ok(())
    }
}

async fn ensure_title(pool: &PgPool, title_id: Uuid) -> ApiResult<()> {
    Title::find_by_id(pool, title_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Title not found".to_string()))
}

async fn load_review(pool: &PgPool, title_id: Uuid, review_id: Uuid) -> ApiResult<Review> {
    Review::find_in_title(pool, title_id, review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiPath(title_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<LimitOffsetParams>,
) -> ApiResult<Json<Page<ReviewResponse>>> {
    ensure_title(&state.db, title_id).await?;

    let window = LimitOffset::from_params(&params);
    let count = Review::count_by_title(&state.db, title_id).await?;
    let reviews =
        Review::list_by_title(&state.db, title_id, window.limit(), window.offset()).await?;

    Ok(Json(window.page(&uri, count, reviews).map(ReviewResponse::from)))
}

pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(title_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let user = require_authenticated(auth.user())?;
    ensure_title(&state.db, title_id).await?;
    req.check(false)?;

    // One review per user per title; only creation is checked
    if Review::exists_for_author(&state.db, title_id, user.id).await? {
        return Err(ApiError::field(
            "non_field_errors",
            "Only one review per user per title is allowed",
        ));
    }

    let review = Review::create(
        &state.db,
        CreateReview {
            title_id,
            author_id: user.id,
            text: req.text.unwrap_or_default(),
            score: req.score.unwrap_or(DEFAULT_SCORE),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

pub async fn get_review(
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<ReviewResponse>> {
    Ok(Json(load_review(&state.db, title_id, review_id).await?.into()))
}

async fn update_review(
    state: AppState,
    auth: AuthContext,
    method: Method,
    (title_id, review_id): (Uuid, Uuid),
    req: ReviewRequest,
    partial: bool,
) -> ApiResult<Json<ReviewResponse>> {
    require_authenticated(auth.user())?;
    let review = load_review(&state.db, title_id, review_id).await?;
    write_only_author_or(&method, auth.user(), Some(review.author_id))?;

    req.check(partial)?;

    let updated = Review::update(
        &state.db,
        review.id,
        UpdateReview {
            text: req.text,
            score: req.score,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    tracing::info!(review_id = %review.id, partial, "Review updated");
    Ok(Json(updated.into()))
}

pub async fn patch_review(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(ids): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    update_review(state, auth, method, ids, req, true).await
}

pub async fn put_review(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(ids): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    update_review(state, auth, method, ids, req, false).await
}

pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath((title_id, review_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_authenticated(auth.user())?;
    let review = load_review(&state.db, title_id, review_id).await?;
    write_only_author_or(&method, auth.user(), Some(review.author_id))?;

    Review::delete(&state.db, review.id).await?;

    tracing::info!(review_id = %review.id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}
