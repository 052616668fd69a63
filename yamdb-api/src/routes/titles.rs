/// Title endpoints
///
/// Reads return nested category/genre objects and the computed rating;
/// writes take and return slugs.
///
/// # Endpoints
///
/// - `GET /v1/titles/` - List, filtered by `name`, `year`, `category`, `genre`
/// - `POST /v1/titles/` - Create (admin)
/// - `GET /v1/titles/:title_id/` - Retrieve
/// - `PATCH /v1/titles/:title_id/` - Partial update (admin)
/// - `PUT /v1/titles/:title_id/` - Full update (admin)
/// - `DELETE /v1/titles/:title_id/` - Delete (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::{Page, PageNumber, PageParams},
    routes::catalog::CatalogResponse,
    validation::check_year,
};
use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;
use yamdb_shared::{
    auth::{middleware::AuthContext, permissions::admin_or_read_only},
    models::{
        catalog::{CatalogEntry, CatalogKind},
        title::{CreateTitle, Title, TitleDetail, TitleFilter, UpdateTitle},
    },
};

/// Read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleResponse {
    pub id: Uuid,
    pub name: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<CatalogResponse>,
    pub category: CatalogResponse,
}

impl From<TitleDetail> for TitleResponse {
    fn from(title: TitleDetail) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            rating: title.rating,
            description: title.description,
            genre: title.genres.into_iter().map(CatalogResponse::from).collect(),
            category: title.category.into(),
        }
    }
}

/// Write shape: relations as slugs, no rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleWriteResponse {
    pub id: Uuid,
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: String,
}

impl From<TitleDetail> for TitleWriteResponse {
    fn from(title: TitleDetail) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
            genre: title.genres.into_iter().map(|g| g.slug).collect(),
            category: title.category.slug,
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create/update body
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TitleRequest {
    #[validate(length(min = 1, max = 250, message = "Name must be 1 to 250 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub year: Option<Option<i32>>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    /// Genre slugs
    pub genre: Option<Vec<String>>,

    /// Category slug
    pub category: Option<String>,
}

impl TitleRequest {
    /// Field checks; `partial` (PATCH) lifts the required-field rule
    fn check(&self, partial: bool) -> ApiResult<()> {
        self.validate()?;

        let mut missing = Vec::new();
        if !partial {
            for (field, present) in [
                ("name", self.name.is_some()),
                ("genre", self.genre.is_some()),
                ("category", self.category.is_some()),
            ] {
                if !present {
                    missing.push(ValidationErrorDetail {
                        field: field.to_string(),
                        message: "This field is required".to_string(),
                    });
                }
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::ValidationError(missing));
        }

        // A title always keeps at least one genre
        if self.genre.as_ref().is_some_and(Vec::is_empty) {
            return Err(ApiError::field("genre", "This list may not be empty"));
        }

        if let Some(Some(year)) = self.year {
            check_year("year", year)?;
        }

        Ok(())
    }
}

/// Relations resolved from slugs
struct ResolvedRelations {
    category_id: Option<Uuid>,
    genre_ids: Option<Vec<Uuid>>,
}

async fn resolve_relations(pool: &PgPool, req: &TitleRequest) -> ApiResult<ResolvedRelations> {
    let mut errors = Vec::new();

    let category_id = match req.category.as_deref() {
        None => None,
        Some(slug) => match CatalogEntry::find_by_slug(pool, CatalogKind::Category, slug).await? {
            Some(category) => Some(category.id),
            None => {
                errors.push(ValidationErrorDetail {
                    field: "category".to_string(),
                    message: format!("Object with slug={} does not exist", slug),
                });
                None
            }
        },
    };

    let genre_ids = match req.genre.as_ref() {
        None => None,
        Some(slugs) => {
            let mut wanted = slugs.clone();
            wanted.sort();
            wanted.dedup();

            let found = CatalogEntry::find_by_slugs(pool, CatalogKind::Genre, &wanted).await?;
            for slug in wanted.iter().filter(|s| !found.iter().any(|g| &g.slug == *s)) {
                errors.push(ValidationErrorDetail {
                    field: "genre".to_string(),
                    message: format!("Object with slug={} does not exist", slug),
                });
            }
            Some(found.into_iter().map(|g| g.id).collect())
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    Ok(ResolvedRelations {
        category_id,
        genre_ids,
    })
}

async fn load_detail(pool: &PgPool, id: Uuid) -> ApiResult<TitleDetail> {
    Title::find_detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Title not found".to_string()))
}

/// List query filters
#[derive(Debug, Default, Deserialize)]
pub struct TitleFilterParams {
    pub name: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
}

impl TitleFilterParams {
    fn into_filter(self) -> ApiResult<TitleFilter> {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        let year = match non_empty(self.year) {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| ApiError::field("year", "Enter a number"))?,
            ),
        };

        Ok(TitleFilter {
            name: non_empty(self.name),
            year,
            category: non_empty(self.category),
            genre: non_empty(self.genre),
        })
    }
}

pub async fn list_titles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(params): ApiQuery<TitleFilterParams>,
) -> ApiResult<Json<Page<TitleResponse>>> {
    let filter = params.into_filter()?;
    let window = PageNumber::from_params(&page, state.page_size())?;

    let count = Title::count(&state.db, &filter).await?;
    window.check(count)?;

    let titles = Title::list_details(&state.db, &filter, window.limit(), window.offset()).await?;

    Ok(Json(window.page(&uri, count, titles).map(TitleResponse::from)))
}

pub async fn get_title(
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<Uuid>,
) -> ApiResult<Json<TitleResponse>> {
    Ok(Json(load_detail(&state.db, title_id).await?.into()))
}

pub async fn create_title(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiJson(req): ApiJson<TitleRequest>,
) -> ApiResult<(StatusCode, Json<TitleWriteResponse>)> {
    admin_or_read_only(&method, auth.user())?;
    req.check(false)?;

    let relations = resolve_relations(&state.db, &req).await?;
    let (Some(category_id), Some(genre_ids)) = (relations.category_id, relations.genre_ids) else {
        return Err(ApiError::BadRequest("Category and genre are required".to_string()));
    };

    let title = Title::create(
        &state.db,
        CreateTitle {
            name: req.name.unwrap_or_default(),
            year: req.year.flatten(),
            description: req.description.flatten(),
            category_id,
            genre_ids,
        },
    )
    .await?;

    let detail = load_detail(&state.db, title.id).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn update_title(
    state: AppState,
    auth: AuthContext,
    method: Method,
    title_id: Uuid,
    req: TitleRequest,
    partial: bool,
) -> ApiResult<Json<TitleWriteResponse>> {
    admin_or_read_only(&method, auth.user())?;

    if Title::find_by_id(&state.db, title_id).await?.is_none() {
        return Err(ApiError::NotFound("Title not found".to_string()));
    }

    req.check(partial)?;
    let relations = resolve_relations(&state.db, &req).await?;

    // PUT replaces the whole resource, so absent nullable fields are cleared
    let (year, description) = if partial {
        (req.year, req.description)
    } else {
        (Some(req.year.flatten()), Some(req.description.flatten()))
    };

    Title::update(
        &state.db,
        title_id,
        UpdateTitle {
            name: req.name,
            year,
            description,
            category_id: relations.category_id,
            genre_ids: relations.genre_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Title not found".to_string()))?;

    tracing::info!(title_id = %title_id, partial, "Title updated");

    Ok(Json(load_detail(&state.db, title_id).await?.into()))
}

pub async fn patch_title(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(title_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TitleRequest>,
) -> ApiResult<Json<TitleWriteResponse>> {
    update_title(state, auth, method, title_id, req, true).await
}

pub async fn put_title(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(title_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TitleRequest>,
) -> ApiResult<Json<TitleWriteResponse>> {
    update_title(state, auth, method, title_id, req, false).await
}

pub async fn delete_title(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(title_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    admin_or_read_only(&method, auth.user())?;

    if !Title::delete(&state.db, title_id).await? {
        return Err(ApiError::NotFound("Title not found".to_string()));
    }

    tracing::info!(title_id = %title_id, "Title deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    fn request(json: &str) -> TitleRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_and_absent_are_distinct() {
        let req = request(r#"{"year": null}"#);
        assert_eq!(req.year, Some(None));
        assert_eq!(req.description, None);

        let req = request(r#"{"year": 1999, "description": "x"}"#);
        assert_eq!(req.year, Some(Some(1999)));
        assert_eq!(req.description, Some(Some("x".to_string())));
    }

    #[test]
    fn test_full_write_requires_fields() {
        let err = request(r#"{"year": 2000}"#).check(false).unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, ["name", "genre", "category"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(request(r#"{"year": 2000}"#).check(true).is_ok());
    }

    #[test]
    fn test_future_year_rejected() {
        let next_year = Utc::now().year() + 1;
        let req = request(&format!(
            r#"{{"name": "X", "year": {next_year}, "category": "drama", "genre": ["comedy"]}}"#
        ));
        assert!(matches!(req.check(false), Err(ApiError::ValidationError(_))));

        let req = request(r#"{"name": "X", "year": 2020, "category": "drama", "genre": ["comedy"]}"#);
        assert!(req.check(false).is_ok());
    }

    #[test]
    fn test_empty_genre_list_rejected() {
        for partial in [false, true] {
            let err = request(r#"{"name": "X", "category": "drama", "genre": []}"#)
                .check(partial)
                .unwrap_err();
            match err {
                ApiError::ValidationError(details) => assert_eq!(details[0].field, "genre"),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        assert!(request(r#"{"name": "Y"}"#).check(true).is_ok());
    }

    #[test]
    fn test_filter_params() {
        let filter = TitleFilterParams {
            name: Some("".into()),
            year: Some("1994".into()),
            category: Some("movie".into()),
            genre: None,
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.name, None);
        assert_eq!(filter.year, Some(1994));
        assert_eq!(filter.category.as_deref(), Some("movie"));

        let bad = TitleFilterParams {
            year: Some("nineteen".into()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn test_write_response_uses_slugs() {
        let detail = TitleDetail {
            id: Uuid::new_v4(),
            name: "X".into(),
            year: Some(2020),
            description: None,
            category: CatalogEntry {
                id: Uuid::new_v4(),
                name: "Drama".into(),
                slug: "drama".into(),
            },
            genres: vec![CatalogEntry {
                id: Uuid::new_v4(),
                name: "Comedy".into(),
                slug: "comedy".into(),
            }],
            rating: Some(5.0),
        };

        let write = TitleWriteResponse::from(detail.clone());
        assert_eq!(write.category, "drama");
        assert_eq!(write.genre, vec!["comedy"]);
        let json = serde_json::to_value(&write).unwrap();
        assert!(json.get("rating").is_none());

        let read = TitleResponse::from(detail);
        assert_eq!(read.genre[0].slug, "comedy");
        assert_eq!(read.rating, Some(5.0));
    }
}
