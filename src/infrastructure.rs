//! Infrastructure layer for configuration, logging and SQLite persistence

pub mod config;
pub mod database_connection;
pub mod logging;
pub mod repositories;

// Re-export commonly used items
pub use config::{AdminConfig, AppConfig, ConfigError, ConfigManager, DatabaseConfig, LoggingConfig};
pub use database_connection::DatabaseConnection;
pub use logging::{get_log_directory, init_logging_with_config};
pub use repositories::{SqliteAssociationRepository, SqliteCatalogRepository};
