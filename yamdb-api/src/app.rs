/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use yamdb_api::{app::AppState, config::Config};
/// use yamdb_shared::mail::LogMailer;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(LogMailer));
/// let app = yamdb_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, MethodRouter},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use yamdb_shared::{auth::middleware::create_auth_middleware, mail::Mailer};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email transport
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Page size for `?page=` lists
    pub fn page_size(&self) -> i64 {
        self.config.pagination.page_size
    }
}

/// Registers a route both with and without a trailing slash
fn route_both(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check
/// └── /v1/
///     ├── /auth/signup, /auth/token             # Registration and tokens
///     ├── /categories/, /categories/:slug/      # Admin-write catalog
///     ├── /genres/, /genres/:slug/
///     ├── /titles/, /titles/:title_id/
///     │   └── /reviews/, /reviews/:review_id/   # Author-or-staff writes
///     │       └── /comments/, /comments/:comment_id/
///     └── /users/, /users/me/, /users/:username/  # Admin only, except me
/// ```
///
/// Every path also matches without its trailing slash.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication: resolves the principal, anonymous without a header
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let mut v1_routes = Router::new();
    for (path, method_router) in [
        ("/auth/signup", post(routes::auth::signup)),
        ("/auth/token", post(routes::auth::obtain_token)),
        (
            "/categories",
            get(routes::catalog::list_categories).post(routes::catalog::create_category),
        ),
        ("/categories/:slug", delete(routes::catalog::delete_category)),
        (
            "/genres",
            get(routes::catalog::list_genres).post(routes::catalog::create_genre),
        ),
        ("/genres/:slug", delete(routes::catalog::delete_genre)),
        (
            "/titles",
            get(routes::titles::list_titles).post(routes::titles::create_title),
        ),
        (
            "/titles/:title_id",
            get(routes::titles::get_title)
                .patch(routes::titles::patch_title)
                .put(routes::titles::put_title)
                .delete(routes::titles::delete_title),
        ),
        (
            "/titles/:title_id/reviews",
            get(routes::reviews::list_reviews).post(routes::reviews::create_review),
        ),
        (
            "/titles/:title_id/reviews/:review_id",
            get(routes::reviews::get_review)
                .patch(routes::reviews::patch_review)
                .put(routes::reviews::put_review)
                .delete(routes::reviews::delete_review),
        ),
        (
            "/titles/:title_id/reviews/:review_id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        ),
        (
            "/titles/:title_id/reviews/:review_id/comments/:comment_id",
            get(routes::comments::get_comment)
                .patch(routes::comments::patch_comment)
                .put(routes::comments::put_comment)
                .delete(routes::comments::delete_comment),
        ),
        (
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        ),
        (
            "/users/me",
            get(routes::users::get_me).patch(routes::users::patch_me),
        ),
        (
            "/users/:username",
            get(routes::users::get_user)
                .patch(routes::users::patch_user)
                .put(routes::users::put_user)
                .delete(routes::users::delete_user),
        ),
    ] {
        v1_routes = route_both(v1_routes, path, method_router);
    }

    let v1_routes = v1_routes.layer(axum::middleware::from_fn(create_auth_middleware(
        state.db.clone(),
        state.jwt_secret().to_string(),
    )));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
