/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     email VARCHAR(254) NOT NULL UNIQUE,
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     bio TEXT NOT NULL DEFAULT '',
///     role user_role NOT NULL DEFAULT 'user',
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     confirmation_code VARCHAR(70) UNIQUE,
///     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Every created user gets a confirmation code. The plaintext is returned
/// from [`User::create`] exactly once; only its digest is stored.
///
/// # Example
///
/// ```no_run
/// use yamdb_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let (user, code) = User::create(&pool, CreateUser::signup("alice", "alice@example.com")).await?;
/// println!("Created {} with code {}", user.username, code);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::like_pattern;
use crate::auth::confirmation;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, \
                            is_superuser, confirmation_code, date_joined";

/// Account roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account: writes own reviews and comments
    #[default]
    User,

    /// Can edit or delete anyone's reviews and comments
    Moderator,

    /// Full control over catalog and accounts
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Unique email address; confirmation codes are mailed here
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    pub bio: String,

    pub role: UserRole,

    /// Bypasses role checks, like an admin
    pub is_superuser: bool,

    /// SHA-256 digest of the confirmation code
    #[serde(skip_serializing)]
    pub confirmation_code: Option<String>,

    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Admin role or superuser
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == UserRole::Admin
    }

    /// Moderator role
    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    /// Checks a submitted confirmation code against the stored digest
    pub fn confirmation_code_matches(&self, code: &str) -> bool {
        self.confirmation_code
            .as_deref()
            .is_some_and(|digest| confirmation::verify_code(code, digest))
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: UserRole,
}

impl CreateUser {
    /// Minimal self-registration input: regular role, empty profile
    pub fn signup(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

/// Input for updating a user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.role.is_none()
    }
}

impl User {
    /// Inserts a user with a freshly generated confirmation code
    ///
    /// Returns the user and the plaintext code.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate username or email (unique constraint violation).
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<(Self, String), sqlx::Error> {
        let (code, digest) = confirmation::generate_code();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, bio, role, confirmation_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.bio)
        .bind(data.role)
        .bind(digest)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok((user, code))
    }

    /// Replaces the user's confirmation code and returns the new plaintext
    ///
    /// The previous code stops matching. Returns `None` if the user doesn't
    /// exist.
    pub async fn reissue_confirmation_code(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<String>, sqlx::Error> {
        let (code, digest) = confirmation::generate_code();

        let updated = sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
            .bind(id)
            .bind(digest)
            .execute(pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::info!(user_id = %id, "Confirmation code reissued");
        Ok(Some(code))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Updates the listed fields of a user
    ///
    /// Returns `None` if the user doesn't exist. An empty update just
    /// re-reads the row.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut assignments = Vec::new();
        let mut bind_count = 1;
        for (column, present) in [
            ("username", data.username.is_some()),
            ("email", data.email.is_some()),
            ("first_name", data.first_name.is_some()),
            ("last_name", data.last_name.is_some()),
            ("bio", data.bio.is_some()),
            ("role", data.role.is_some()),
        ] {
            if present {
                bind_count += 1;
                assignments.push(format!("{column} = ${bind_count}"));
            }
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {USER_COLUMNS}",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);
        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(bio) = data.bio {
            q = q.bind(bio);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user; their reviews go with them, their comments are orphaned
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users ordered by username, optionally filtered by a
    /// case-insensitive username substring
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::TEXT IS NULL OR username ILIKE $1)
            ORDER BY username
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(search.map(like_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts users matching the same filter as [`User::list`]
    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR username ILIKE $1)")
            .bind(search.map(like_pattern))
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, is_superuser: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser,
            confirmation_code: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_role_predicates() {
        assert!(user(UserRole::Admin, false).is_admin());
        assert!(user(UserRole::User, true).is_admin());
        assert!(!user(UserRole::Moderator, false).is_admin());
        assert!(user(UserRole::Moderator, false).is_moderator());
        assert!(!user(UserRole::User, false).is_moderator());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&UserRole::Moderator).unwrap(), "\"moderator\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert!(serde_json::from_str::<UserRole>("\"owner\"").is_err());
        assert_eq!(UserRole::default(), UserRole::User);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_confirmation_code_matches() {
        let (code, digest) = confirmation::generate_code();
        let mut u = user(UserRole::User, false);

        assert!(!u.confirmation_code_matches(&code));

        u.confirmation_code = Some(digest);
        assert!(u.confirmation_code_matches(&code));
        assert!(!u.confirmation_code_matches("nope"));
    }

    #[test]
    fn test_confirmation_code_never_serialized() {
        let mut u = user(UserRole::User, false);
        u.confirmation_code = Some("digest".to_string());

        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("confirmation_code").is_none());
    }

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser {
            bio: Some("hi".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_signup_input_defaults() {
        let input = CreateUser::signup("bob", "bob@example.com");
        assert_eq!(input.role, UserRole::User);
        assert!(input.bio.is_empty());
    }
}
