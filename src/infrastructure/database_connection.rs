// Database connection and pool management
// This module handles SQLite database connections using sqlx

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::infrastructure::config::DatabaseConfig;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Connect with default pool settings
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_config(&DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    pub async fn with_config(config: &DatabaseConfig) -> Result<Self> {
        let in_memory = is_memory_url(&config.url);

        if !in_memory {
            if let Some(parent) = Path::new(strip_scheme(&config.url)).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
                }
            }
        }

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database URL: {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        // Every connection to `sqlite::memory:` opens its own database, so an
        // in-memory pool is pinned to one connection that is never recycled
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            pool_options = pool_options.max_connections(config.max_connections);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", config.url))?;

        debug!(url = %config.url, in_memory, "Database pool ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn strip_scheme(url: &str) -> &str {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

fn is_memory_url(url: &str) -> bool {
    let path = strip_scheme(url);
    path == ":memory:" || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_url_helpers() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(!is_memory_url("sqlite:/tmp/admin.db"));
        assert_eq!(strip_scheme("sqlite:///tmp/admin.db?mode=rwc"), "/tmp/admin.db");
        assert_eq!(strip_scheme("sqlite:data/admin.db"), "data/admin.db");
    }

    #[tokio::test]
    async fn test_database_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("test.db");
        let database_url = format!("sqlite:{}", db_path.to_string_lossy());

        let db = DatabaseConnection::new(&database_url).await?;

        assert!(!db.pool().is_closed());
        assert!(db_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_database_migration() -> Result<()> {
        let db = DatabaseConnection::new("sqlite::memory:").await?;
        db.migrate().await?;

        for table in ["products", "items", "subscriptions", "product_items", "subscription_products"] {
            let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                .bind(table)
                .fetch_optional(db.pool())
                .await?;
            assert!(result.is_some(), "missing table {table}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() -> Result<()> {
        let db = DatabaseConnection::new("sqlite::memory:").await?;
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await?;
        assert_eq!(enabled, 1);
        Ok(())
    }
}
