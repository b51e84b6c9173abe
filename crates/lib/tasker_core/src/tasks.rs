//! Task persistence.
//!
//! Tasks form a flat collection with no owner column; any authenticated
//! caller sees every task.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::task::{NewTask, Task, TaskUpdate};

/// Default page size for [`list_tasks`].
pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on the page size for [`list_tasks`].
pub const MAX_LIMIT: i64 = 100;

/// Create a new task. `completed` starts false and `created_at` is set here.
pub async fn create_task(pool: &SqlitePool, task: &NewTask) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (title, description, completed, created_at)
        VALUES ($1, $2, FALSE, $3)
        RETURNING id, title, description, completed, created_at
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// List tasks in creation order.
pub async fn list_tasks(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, completed, created_at
        FROM tasks
        ORDER BY id ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
}

/// Get a task by ID. Missing rows surface as `sqlx::Error::RowNotFound`.
pub async fn get_task(pool: &SqlitePool, task_id: i64) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, completed, created_at
        FROM tasks
        WHERE id = $1
        "#,
    )
    .bind(task_id)
    .fetch_one(pool)
    .await
}

/// Apply a partial update inside a transaction and return the merged row.
pub async fn update_task(
    pool: &SqlitePool,
    task_id: i64,
    update: TaskUpdate,
) -> Result<Task, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let mut task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, completed, created_at FROM tasks WHERE id = $1",
    )
    .bind(task_id)
    .fetch_one(&mut *tx)
    .await?;

    update.apply(&mut task);

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET title = $1, description = $2, completed = $3
        WHERE id = $4
        RETURNING id, title, description, completed, created_at
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.completed)
    .bind(task_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(task)
}

/// Delete a task. Returns `false` when no row matched.
pub async fn delete_task(pool: &SqlitePool, task_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
