//! Request and response bodies.
//!
//! Tasks and users are serialized from the `tasker_core` domain types
//! directly; only shapes specific to the HTTP surface live here.

use serde::{Deserialize, Serialize};

pub use tasker_core::models::auth::User as UserResponse;
pub use tasker_core::models::task::{NewTask as CreateTaskRequest, Task as TaskResponse};
pub use tasker_core::models::task::TaskUpdate as UpdateTaskRequest;

/// Error body returned by every handler, guard and extractor failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` form (OAuth2 password-flow field names).
///
/// Extra OAuth2 fields such as `grant_type` and `scope` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// `GET /tasks` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /health/detailed` body. Each dependency reports `"ok"` or
/// `"error: <detail>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub database: String,
    pub redis: String,
    pub version: String,
}
