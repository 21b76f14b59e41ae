use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::time::Duration;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};

pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 as test")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                AppError::from(e)
            })?;

        let test_value: i32 = row.try_get("test").map_err(AppError::from)?;

        if test_value == 1 {
            Ok(())
        } else {
            Err(AppError::Database("Unexpected health check result".to_string()))
        }
    }

    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM templates) as template_count,
                (SELECT COUNT(*) FROM responses) as response_count,
                (SELECT COUNT(*) FROM users) as user_count
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(DatabaseStats {
            template_count: row.try_get("template_count")?,
            response_count: row.try_get("response_count")?,
            user_count: row.try_get("user_count")?,
            connection_pool_size: self.pool.size() as i64,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub template_count: i64,
    pub response_count: i64,
    pub user_count: i64,
    pub connection_pool_size: i64,
}

/// Open the pool described by the configuration. `sqlite::memory:` gets a
/// single long-lived connection so every query sees the same database.
pub async fn get_database_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    if config.url == MEMORY_DATABASE_URL {
        return get_memory_pool().await;
    }

    info!("Connecting to database: {}", config.url);

    let url = if config.url.contains('?') {
        config.url.clone()
    } else {
        format!("{}?mode=rwc", config.url)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&url)
        .await
        .map_err(|e| {
            error!("Failed to create database pool: {}", e);
            AppError::from(e)
        })?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await
        .map_err(AppError::from)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(AppError::from)?;

    sqlx::query("PRAGMA busy_timeout = 30000")
        .execute(&pool)
        .await
        .map_err(AppError::from)?;

    apply_connection_pragmas(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

pub async fn get_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(MEMORY_DATABASE_URL)
        .await
        .map_err(|e| {
            error!("Failed to open in-memory database: {}", e);
            AppError::from(e)
        })?;

    apply_connection_pragmas(&pool).await?;

    Ok(pool)
}

async fn apply_connection_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .map_err(AppError::from)?;

    Ok(())
}
