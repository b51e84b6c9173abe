//! Task request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tasker_core::tasks::{self, DEFAULT_LIMIT, MAX_LIMIT};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::models::{CreateTaskRequest, ListTasksQuery, TaskResponse, UpdateTaskRequest};

fn not_found(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Task not found".into()),
        other => AppError::from(other),
    }
}

/// `POST /tasks`: create a task.
pub async fn create_task_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    body.validate().map_err(AppError::Validation)?;
    let task = tasks::create_task(&state.pool, &body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks?skip=&limit=`: list tasks.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListTasksQuery>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if skip < 0 {
        return Err(AppError::Validation("skip must not be negative".into()));
    }
    if !(0..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 0 and {MAX_LIMIT}"
        )));
    }
    let rows = tasks::list_tasks(&state.pool, skip, limit).await?;
    Ok(Json(rows))
}

/// `GET /tasks/{task_id}`: fetch one task.
pub async fn get_task_handler(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i64>,
) -> AppResult<Json<TaskResponse>> {
    let task = tasks::get_task(&state.pool, task_id)
        .await
        .map_err(not_found)?;
    Ok(Json(task))
}

/// `PUT /tasks/{task_id}`: merge the supplied fields into a task.
pub async fn update_task_handler(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i64>,
    JsonBody(body): JsonBody<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    body.validate().map_err(AppError::Validation)?;
    let task = tasks::update_task(&state.pool, task_id, body)
        .await
        .map_err(not_found)?;
    Ok(Json(task))
}

/// `DELETE /tasks/{task_id}`: delete a task.
pub async fn delete_task_handler(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i64>,
) -> AppResult<StatusCode> {
    if !tasks::delete_task(&state.pool, task_id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
