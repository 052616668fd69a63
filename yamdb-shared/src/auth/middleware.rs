/// Authentication middleware for Axum
///
/// Resolves the request principal from an `Authorization: Bearer <token>`
/// header and stores it in request extensions as an [`AuthContext`].
///
/// - No header: anonymous principal, the request proceeds
/// - Malformed header, invalid or expired token: 401
/// - Valid token for a user that no longer exists: 401
///
/// The user row is reloaded on every request so role changes take effect
/// immediately.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use yamdb_shared::auth::middleware::{create_auth_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn whoami(auth: AuthContext) -> String {
///     auth.user().map(|u| u.username.clone()).unwrap_or_else(|| "anonymous".into())
/// }
///
/// # fn setup(pool: PgPool) -> Router {
/// Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_auth_middleware(pool, "secret".to_string())))
/// # }
/// ```

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Request principal
///
/// Handlers take it directly as an extractor; requests that skipped the
/// middleware are anonymous.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<User>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// The authenticated user, if any
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Authorization header is not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Token subject no longer exists
    #[error("User not found")]
    UnknownUser,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::DatabaseError(e) => {
                tracing::error!(error = %e, "Failed to load request principal");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            _ => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Resolves the principal for one request
pub async fn auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        req.extensions_mut().insert(AuthContext::anonymous());
        return Ok(next.run(req).await);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    tracing::debug!(user_id = %user.id, role = user.role.as_str(), "Request authenticated");

    req.extensions_mut().insert(AuthContext::authenticated(user));
    Ok(next.run(req).await)
}

/// Creates an authentication middleware closure
///
/// Captures the pool and signing secret for use with
/// `axum::middleware::from_fn`.
pub fn create_auth_middleware(
    pool: PgPool,
    secret: String,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(auth_middleware(pool, secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_lazy_pool, DatabaseConfig};
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(auth: AuthContext) -> String {
        auth.user()
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Router whose secret and pool are dropped once it is built
    fn guarded_router() -> Router {
        let secret = String::from("a-secret-that-goes-out-of-scope-here");
        let pool = create_lazy_pool(&DatabaseConfig {
            min_connections: 0,
            ..DatabaseConfig::new("postgresql://nobody@127.0.0.1:1/none")
        })
        .unwrap();

        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn(create_auth_middleware(pool, secret.clone())))
    }

    #[tokio::test]
    async fn test_layer_owns_its_secret() {
        let router = guarded_router();

        let response = router
            .clone()
            .oneshot(axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"anonymous");

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_default_context_is_anonymous() {
        let context = AuthContext::default();
        assert!(!context.is_authenticated());
        assert!(context.user().is_none());
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::InvalidFormat("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::UnknownUser.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::DatabaseError("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
