/// User administration and self-profile endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/` - List, `?search=` on username (admin)
/// - `POST /v1/users/` - Create (admin)
/// - `GET`, `PATCH`, `PUT`, `DELETE /v1/users/:username/` (admin)
/// - `GET`, `PATCH /v1/users/me/` - Own profile (any authenticated user)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::{Page, PageNumber, PageParams},
    routes::catalog::SearchParams,
    validation::check_username,
};
use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;
use yamdb_shared::{
    auth::{
        middleware::AuthContext,
        permissions::{admin_only, require_authenticated},
    },
    models::user::{CreateUser, UpdateUser, User, UserRole},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: Option<String>,

    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: Option<String>,

    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,

    pub bio: Option<String>,

    pub role: Option<UserRole>,
}

impl UserRequest {
    /// Field checks; `partial` (PATCH) lifts the required-field rule
    fn check(&self, partial: bool) -> ApiResult<()> {
        self.validate()?;

        if !partial {
            let missing: Vec<ValidationErrorDetail> = [
                ("username", self.username.is_some()),
                ("email", self.email.is_some()),
            ]
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(field, _)| ValidationErrorDetail {
                field: field.to_string(),
                message: "This field is required".to_string(),
            })
            .collect();

            if !missing.is_empty() {
                return Err(ApiError::ValidationError(missing));
            }
        }

        if let Some(username) = &self.username {
            check_username("username", username)?;
        }

        Ok(())
    }

    fn into_update(self) -> UpdateUser {
        UpdateUser {
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            role: self.role,
        }
    }
}

/// Rejects a username or email held by another account
async fn check_unique(pool: &PgPool, req: &UserRequest, except: Option<Uuid>) -> ApiResult<()> {
    let mut taken = Vec::new();

    if let Some(username) = &req.username {
        if let Some(other) = User::find_by_username(pool, username).await? {
            if Some(other.id) != except {
                taken.push(ValidationErrorDetail {
                    field: "username".to_string(),
                    message: "A user with that username already exists".to_string(),
                });
            }
        }
    }

    if let Some(email) = &req.email {
        if let Some(other) = User::find_by_email(pool, email).await? {
            if Some(other.id) != except {
                taken.push(ValidationErrorDetail {
                    field: "email".to_string(),
                    message: "A user with that email already exists".to_string(),
                });
            }
        }
    }

    if !taken.is_empty() {
        return Err(ApiError::ValidationError(taken));
    }

    Ok(())
}

async fn load_user(pool: &PgPool, username: &str) -> ApiResult<User> {
    User::find_by_username(pool, username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn apply_update(
    pool: &PgPool,
    user: &User,
    req: UserRequest,
    partial: bool,
) -> ApiResult<UserResponse> {
    req.check(partial)?;
    check_unique(pool, &req, Some(user.id)).await?;

    let updated = User::update(pool, user.id, req.into_update())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(updated.into())
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<SearchParams>,
) -> ApiResult<Json<Page<UserResponse>>> {
    admin_only(auth.user())?;

    let search = search.search.as_deref().filter(|s| !s.is_empty());
    let window = PageNumber::from_params(&page, state.page_size())?;

    let count = User::count(&state.db, search).await?;
    window.check(count)?;

    let users = User::list(&state.db, search, window.limit(), window.offset()).await?;

    Ok(Json(window.page(&uri, count, users).map(UserResponse::from)))
}

/// Creates an account on an admin's behalf
///
/// A confirmation code is generated but not mailed.
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<UserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let admin = admin_only(auth.user())?;
    req.check(false)?;
    check_unique(&state.db, &req, None).await?;

    let (user, _code) = User::create(
        &state.db,
        CreateUser {
            username: req.username.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            first_name: req.first_name.unwrap_or_default(),
            last_name: req.last_name.unwrap_or_default(),
            bio: req.bio.unwrap_or_default(),
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "User created by admin");

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<UserResponse>> {
    admin_only(auth.user())?;
    Ok(Json(load_user(&state.db, &username).await?.into()))
}

pub async fn patch_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(username): ApiPath<String>,
    ApiJson(req): ApiJson<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    admin_only(auth.user())?;
    let user = load_user(&state.db, &username).await?;
    Ok(Json(apply_update(&state.db, &user, req, true).await?))
}

pub async fn put_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(username): ApiPath<String>,
    ApiJson(req): ApiJson<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    admin_only(auth.user())?;
    let user = load_user(&state.db, &username).await?;
    Ok(Json(apply_update(&state.db, &user, req, false).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let admin = admin_only(auth.user())?;
    let user = load_user(&state.db, &username).await?;

    User::delete(&state.db, user.id).await?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_me(auth: AuthContext) -> ApiResult<Json<UserResponse>> {
    let user = require_authenticated(auth.user())?;
    Ok(Json(user.clone().into()))
}

/// Updates the caller's own profile; `role` is ignored
pub async fn patch_me(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(mut req): ApiJson<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = require_authenticated(auth.user())?;

    if req.role.take().is_some() {
        tracing::debug!(user_id = %user.id, "Dropped role from self-profile update");
    }

    Ok(Json(apply_update(&state.db, user, req, true).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_write_requires_username_and_email() {
        let err = UserRequest::default().check(false).unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, ["username", "email"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(UserRequest::default().check(true).is_ok());
    }

    #[test]
    fn test_reserved_username_rejected() {
        let req = UserRequest {
            username: Some("me".into()),
            email: Some("me@example.com".into()),
            ..Default::default()
        };
        assert!(req.check(false).is_err());
    }

    #[test]
    fn test_role_parses_known_values_only() {
        let req: UserRequest = serde_json::from_str(r#"{"role": "moderator"}"#).unwrap();
        assert_eq!(req.role, Some(UserRole::Moderator));

        assert!(serde_json::from_str::<UserRequest>(r#"{"role": "owner"}"#).is_err());
    }

    #[test]
    fn test_into_update_keeps_role() {
        let update = UserRequest {
            bio: Some("hi".into()),
            role: Some(UserRole::Admin),
            ..Default::default()
        }
        .into_update();

        assert_eq!(update.role, Some(UserRole::Admin));
        assert_eq!(update.bio.as_deref(), Some("hi"));
        assert!(update.username.is_none());
    }
}
