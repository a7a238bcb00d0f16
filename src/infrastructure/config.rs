//! Configuration infrastructure
//!
//! Configuration is layered with the `config` crate, later sources winning:
//! 1. Built-in defaults
//! 2. `memberships_admin.{json,toml}` in the user config directory (optional)
//! 3. An explicit file passed on the command line (optional)
//! 4. `MEMBERSHIPS_ADMIN_*` environment variables, `__` separating sections
//!    (e.g. `MEMBERSHIPS_ADMIN_DATABASE__URL`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub const APP_DIR_NAME: &str = "memberships-admin";
pub const CONFIG_FILE_STEM: &str = "memberships_admin";
pub const ENV_PREFIX: &str = "MEMBERSHIPS_ADMIN";

pub mod defaults {
    pub const DATABASE_FILE: &str = "memberships.db";
    pub const MAX_CONNECTIONS: u32 = 5;
    pub const BUSY_TIMEOUT_MS: u64 = 5_000;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "memberships-admin.log";

    pub const SERIALIZE_REWRITES: bool = true;
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLx connection URL (`sqlite:<path>` or `sqlite::memory:`)
    pub url: String,

    /// Pool size for file-backed databases
    pub max_connections: u32,

    /// How long a writer waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub directory: Option<PathBuf>,

    pub file_name: String,

    /// Module-specific log level filters (e.g., "sqlx": "warn")
    pub module_filters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serialize in-process rewrites per key pair
    pub serialize_rewrites: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let url = ConfigManager::get_app_data_dir().map_or_else(
            || format!("sqlite:{}", defaults::DATABASE_FILE),
            |dir| format!("sqlite:{}", dir.join(defaults::DATABASE_FILE).display()),
        );

        Self {
            url,
            max_connections: defaults::MAX_CONNECTIONS,
            busy_timeout_ms: defaults::BUSY_TIMEOUT_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("tokio".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            serialize_rewrites: defaults::SERIALIZE_REWRITES,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "database.url cannot be empty".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation {
                message: "database.max_connections must be greater than 0".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation {
                message: format!("logging.level must be one of {LOG_LEVELS:?}, got {:?}", self.logging.level),
            });
        }

        if !self.logging.console_output && !self.logging.file_output {
            return Err(ConfigError::Validation {
                message: "at least one of logging.console_output or logging.file_output must be enabled".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration loader
pub struct ConfigManager {
    explicit_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    pub fn get_app_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Load and validate configuration from all layers
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(dir) = Self::get_config_dir() {
            builder = builder.add_source(
                config::File::with_name(&dir.join(CONFIG_FILE_STEM).to_string_lossy()).required(false),
            );
        }

        if let Some(path) = &self.explicit_path {
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        if let Some(path) = &self.explicit_path {
            info!("Loaded configuration from: {:?}", path);
        }
        Ok(config)
    }
}
