/// Category and genre endpoints
///
/// Both resources behave identically: public listing with `?search=` on the
/// name and page-number pagination; creation and deletion by admins only.
///
/// # Endpoints
///
/// - `GET /v1/categories/`, `GET /v1/genres/` - List
/// - `POST /v1/categories/`, `POST /v1/genres/` - Create
/// - `DELETE /v1/categories/:slug/`, `DELETE /v1/genres/:slug/` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::{Page, PageNumber, PageParams},
    validation::check_slug,
};
use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use yamdb_shared::{
    auth::{middleware::AuthContext, permissions::admin_or_read_only},
    models::catalog::{CatalogEntry, CatalogKind, CreateCatalogEntry},
};

/// Public shape of a category or genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub name: String,
    pub slug: String,
}

impl From<CatalogEntry> for CatalogResponse {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.name,
            slug: entry.slug,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCatalogRequest {
    #[validate(
        required(message = "This field is required"),
        length(min = 1, max = 256, message = "Name must be 1 to 256 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "This field is required"),
        length(min = 1, max = 50, message = "Slug must be 1 to 50 characters")
    )]
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

async fn list_entries(
    state: &AppState,
    kind: CatalogKind,
    uri: &axum::http::Uri,
    page: &PageParams,
    search: &SearchParams,
) -> ApiResult<Page<CatalogResponse>> {
    let search = search.search.as_deref().filter(|s| !s.is_empty());
    let window = PageNumber::from_params(page, state.page_size())?;

    let count = CatalogEntry::count(&state.db, kind, search).await?;
    window.check(count)?;

    let entries =
        CatalogEntry::list(&state.db, kind, search, window.limit(), window.offset()).await?;

    Ok(window
        .page(uri, count, entries)
        .map(CatalogResponse::from))
}

async fn create_entry(
    state: &AppState,
    auth: &AuthContext,
    method: &Method,
    kind: CatalogKind,
    req: CreateCatalogRequest,
) -> ApiResult<(StatusCode, Json<CatalogResponse>)> {
    admin_or_read_only(method, auth.user())?;
    req.validate()?;

    let name = req.name.unwrap_or_default();
    let slug = req.slug.unwrap_or_default();
    check_slug("slug", &slug)?;

    if CatalogEntry::find_by_slug(&state.db, kind, &slug).await?.is_some() {
        return Err(ApiError::field(
            "slug",
            format!("A {} with this slug already exists", kind.label()),
        ));
    }

    let entry = CatalogEntry::create(&state.db, kind, CreateCatalogEntry { name, slug }).await?;
    tracing::info!(kind = kind.label(), slug = %entry.slug, "Catalog entry created");

    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn delete_entry(
    state: &AppState,
    auth: &AuthContext,
    method: &Method,
    kind: CatalogKind,
    slug: &str,
) -> ApiResult<StatusCode> {
    admin_or_read_only(method, auth.user())?;

    if !CatalogEntry::delete_by_slug(&state.db, kind, slug).await? {
        return Err(ApiError::NotFound(format!("No {} with slug {}", kind.label(), slug)));
    }

    tracing::info!(kind = kind.label(), slug, "Catalog entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<SearchParams>,
) -> ApiResult<Json<Page<CatalogResponse>>> {
    list_entries(&state, CatalogKind::Category, &uri, &page, &search)
        .await
        .map(Json)
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiJson(req): ApiJson<CreateCatalogRequest>,
) -> ApiResult<(StatusCode, Json<CatalogResponse>)> {
    create_entry(&state, &auth, &method, CatalogKind::Category, req).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<StatusCode> {
    delete_entry(&state, &auth, &method, CatalogKind::Category, &slug).await
}

pub async fn list_genres(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<SearchParams>,
) -> ApiResult<Json<Page<CatalogResponse>>> {
    list_entries(&state, CatalogKind::Genre, &uri, &page, &search)
        .await
        .map(Json)
}

pub async fn create_genre(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiJson(req): ApiJson<CreateCatalogRequest>,
) -> ApiResult<(StatusCode, Json<CatalogResponse>)> {
    create_entry(&state, &auth, &method, CatalogKind::Genre, req).await
}

pub async fn delete_genre(
    State(state): State<AppState>,
    auth: AuthContext,
    method: Method,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<StatusCode> {
    delete_entry(&state, &auth, &method, CatalogKind::Genre, &slug).await
}
