//! SQLite persistence for datasets and their equipment rows

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub mod datasets;
pub mod retention;

pub use datasets::{CreatedDataset, DatasetStore, StoreError};
pub use retention::RetentionPolicy;

/// Database setup errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Database configuration is invalid
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Open a connection pool, creating the database file if needed.
///
/// Connections use WAL journaling so readers do not block the writer, and
/// enforce foreign keys so deletes cascade to equipment rows.
pub async fn create_pool(config: &DatabaseConfig) -> DbResult<SqlitePool> {
    if !config.url.starts_with("sqlite:") {
        return Err(DbError::Config(format!(
            "unsupported DATABASE_URL '{}', expected a sqlite: URL",
            config.url
        )));
    }

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| DbError::Config(format!("invalid DATABASE_URL '{}': {}", config.url, e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn config(url: String) -> DatabaseConfig {
        DatabaseConfig {
            url,
            max_connections: 2,
            busy_timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_pool_creates_database_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("fresh.db").display());

        let pool = create_pool(&config(url)).await.unwrap();
        run_migrations(&pool).await.unwrap();
        health_check(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('principals', 'datasets', 'equipment') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["datasets", "equipment", "principals"]);
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_config_error() {
        let err = create_pool(&config("postgres://nope".to_string())).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }
}
