//! Authentication service: registration and login flows delegating to
//! `tasker_core::auth`.

use sqlx::SqlitePool;
use tasker_core::auth::{self as core_auth, jwt, password, queries};
use tasker_core::models::auth::User;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{RegisterRequest, TokenResponse};

/// `token_type` reported alongside issued tokens.
pub const TOKEN_TYPE: &str = "bearer";

/// Register a new user with the default role.
pub async fn register(pool: &SqlitePool, req: &RegisterRequest) -> AppResult<User> {
    core_auth::validate_registration(&req.username, &req.email, &req.password)?;

    if queries::username_exists(pool, &req.username).await? {
        return Err(AppError::Validation("Username already exists".into()));
    }
    if queries::email_exists(pool, &req.email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let pw_hash = password::hash_password(&req.password)?;
    let user = queries::create_user(pool, &req.username, &req.email, &pw_hash).await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Authenticate with username + password and issue an access token.
///
/// Unknown users and wrong passwords produce the same error.
pub async fn login(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    jwt_secret: &[u8],
    ttl_minutes: i64,
) -> AppResult<TokenResponse> {
    let Some(found) = queries::find_user_by_username(pool, username).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !password::verify_password(password, &found.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let access_token = jwt::issue_token(
        &found.user.username,
        found.user.role,
        ttl_minutes,
        jwt_secret,
    )?;

    info!(user_id = found.user.id, "user logged in");
    Ok(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}
