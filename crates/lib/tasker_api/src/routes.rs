//! Route paths.
//!
//! Paths under [`API_PREFIX`] are relative to the versioned prefix.

/// Versioned prefix for all API routes.
pub const API_PREFIX: &str = "/v1";

pub const GET_HEALTH: &str = "/health";
pub const GET_HEALTH_DETAILED: &str = "/health/detailed";

pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const GET_AUTH_ADMIN: &str = "/auth/admin";

/// `POST` create, `GET` list.
pub const TASKS: &str = "/tasks";
/// `GET`, `PUT`, `DELETE` a single task.
pub const TASKS_ID: &str = "/tasks/{task_id}";
pub const GET_TASKS_EXTERNAL_JOKE: &str = "/tasks/external-joke";
