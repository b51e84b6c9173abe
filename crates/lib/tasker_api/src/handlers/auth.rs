//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{FormBody, JsonBody};
use crate::middleware::auth::CurrentUser;
use crate::models::{LoginForm, RegisterRequest, TokenResponse, UserResponse};
use crate::services::auth;

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = auth::register(&state.pool, &body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /auth/login`: authenticate with a form-encoded username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        &state.pool,
        &form.username,
        &form.password,
        state.config.jwt_secret.as_bytes(),
        state.config.token_ttl_minutes,
    )
    .await?;
    Ok(Json(resp))
}

/// `GET /auth/admin`: echo the calling admin.
pub async fn admin_handler(Extension(user): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(user.0)
}
