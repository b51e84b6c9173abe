//! Credential store queries.

use sqlx::SqlitePool;

use super::AuthError;
use crate::models::auth::{Role, User, UserWithPassword};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
}

impl UserRow {
    fn into_user(self) -> Result<UserWithPassword, AuthError> {
        let role = self.role.parse::<Role>().map_err(AuthError::Internal)?;
        Ok(UserWithPassword {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                role,
            },
            password_hash: self.password_hash,
        })
    }
}

/// Fetch a user together with the stored password hash.
pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, role FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    row.map(UserRow::into_user).transpose()
}

/// Fetch a user by username, without the password hash.
pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, AuthError> {
    Ok(find_user_by_username(pool, username)
        .await?
        .map(|u| u.user))
}

/// Create a new user with the default role.
///
/// A unique-constraint hit (a concurrent registration that slipped past the
/// existence checks) is reported as [`AuthError::Duplicate`].
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) \
         RETURNING id, username, email, password_hash, role",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(Role::default().as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::Duplicate("Username or email already registered".into())
        }
        other => AuthError::DbError(other),
    })?;
    Ok(row.into_user()?.user)
}

/// Check whether a username is taken.
pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, AuthError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, AuthError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Set a user's role. Returns `false` when the user does not exist.
pub async fn set_user_role(pool: &SqlitePool, username: &str, role: Role) -> Result<bool, AuthError> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE username = $2")
        .bind(role.as_str())
        .bind(username)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
