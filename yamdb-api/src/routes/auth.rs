/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup/` - Register and receive a confirmation code by email
/// - `POST /v1/auth/token/` - Exchange username + confirmation code for an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
    validation::check_username,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use yamdb_shared::{
    auth::jwt::{create_token, Claims},
    mail::confirmation_email,
    models::user::{CreateUser, User},
};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        required(message = "This field is required"),
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "This field is required"),
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters")
    )]
    pub username: Option<String>,
}

/// Signup response: echoes the registered pair
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub email: String,
    pub username: String,
}

/// Token request
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(required(message = "This field is required"))]
    pub username: Option<String>,

    #[validate(required(message = "This field is required"))]
    pub confirmation_code: Option<String>,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Registers a user and mails them a confirmation code
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup/
/// Content-Type: application/json
///
/// { "email": "user@example.com", "username": "user" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or invalid fields, reserved username `me`,
///   username or email held by a different account
///
/// Signing up again with an account's own username and email replaces its
/// code and mails the new one.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    req.validate()?;

    // Both present after validate()
    let email = req.email.unwrap_or_default();
    let username = req.username.unwrap_or_default();

    check_username("username", &username)?;

    let by_username = User::find_by_username(&state.db, &username).await?;
    let by_email = User::find_by_email(&state.db, &email).await?;

    let (user, code) = match (by_username, by_email) {
        // Repeating a signup re-sends a fresh code
        (Some(existing), Some(same)) if existing.id == same.id => {
            let code = User::reissue_confirmation_code(&state.db, existing.id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
            (existing, code)
        }
        (None, None) => User::create(&state.db, CreateUser::signup(&username, &email)).await?,
        (by_username, by_email) => {
            let mut taken = Vec::new();
            if by_username.is_some() {
                taken.push(ValidationErrorDetail {
                    field: "username".to_string(),
                    message: "A user with that username already exists".to_string(),
                });
            }
            if by_email.is_some() {
                taken.push(ValidationErrorDetail {
                    field: "email".to_string(),
                    message: "A user with that email already exists".to_string(),
                });
            }
            return Err(ApiError::ValidationError(taken));
        }
    };

    state
        .mailer
        .send(confirmation_email(&state.config.email.from, &user.email, &code))
        .await?;

    tracing::info!(user_id = %user.id, "Confirmation code sent");

    Ok(Json(SignupResponse {
        email: user.email,
        username: user.username,
    }))
}

/// Exchanges a confirmation code for an access token
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/token/
/// Content-Type: application/json
///
/// { "username": "user", "confirmation_code": "..." }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "token": "eyJ..." }`
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or wrong code
/// - `404 Not Found`: no such user
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    let username = req.username.unwrap_or_default();
    let code = req.confirmation_code.unwrap_or_default();

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.confirmation_code_matches(&code) {
        tracing::debug!(user_id = %user.id, "Confirmation code mismatch");
        return Err(ApiError::field("confirmation_code", "Invalid confirmation code"));
    }

    let token = create_token(&Claims::for_user(user.id, state.config.token_ttl()), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "Access token issued");

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_requires_both_fields() {
        let req: SignupRequest = serde_json::from_str(r#"{"username": "bob"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: SignupRequest =
            serde_json::from_str(r#"{"username": "bob", "email": "not-an-email"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: SignupRequest =
            serde_json::from_str(r#"{"username": "bob", "email": "bob@example.com"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_token_request_requires_code() {
        let req: TokenRequest = serde_json::from_str(r#"{"username": "bob"}"#).unwrap();
        let err = ApiError::from(req.validate().unwrap_err());

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "confirmation_code");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
