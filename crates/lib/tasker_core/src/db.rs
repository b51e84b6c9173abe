//! Relational store connection management.
//!
//! Opens the sqlx SQLite pool that backs the credential and task stores and
//! applies the embedded migrations. Every query borrows a pooled connection
//! for its own duration, so a connection is always returned whether the
//! request succeeds or fails.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

/// Maximum time to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while opening the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// Open a pool for `database_url`, creating the database file if missing,
/// and run migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    info!(max_connections, "opening database pool");
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;

    crate::migrate::migrate(&pool).await?;
    Ok(pool)
}

/// Open a private in-memory database with migrations applied.
///
/// Pinned to a single connection that never expires: every SQLite
/// `:memory:` connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    crate::migrate::migrate(&pool).await?;
    Ok(pool)
}

/// Cheap liveness probe used by the detailed health check.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_is_migrated() {
        let pool = connect_in_memory().await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'tasks') \
             ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["tasks".to_string(), "users".to_string()]);
    }

    #[tokio::test]
    async fn file_database_is_created() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect(&url, 2).await?;
        ping(&pool).await?;
        pool.close().await;

        assert!(path.exists());

        // Reopening an already migrated file is a no-op.
        let pool = connect(&url, 2).await?;
        ping(&pool).await?;
        pool.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn ping_fails_on_closed_pool() {
        let pool = connect_in_memory().await.unwrap();
        pool.close().await;
        assert!(ping(&pool).await.is_err());
    }
}
