//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Console output and optional non-blocking file output
//! - Configuration based log level and per-module filters
//! - Structured JSON logging (optional)
//! - `RUST_LOG` override

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::Directive,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the lifetime of the process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Local time with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter from `RUST_LOG`, falling back to the configured level
/// and module filters
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::new(&config.level);

    // Verbose dependency logs stay quiet unless TRACE is requested
    if !config.level.eq_ignore_ascii_case("trace") {
        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        for (module, level) in modules {
            let directive = format!("{module}={level}")
                .parse::<Directive>()
                .with_context(|| format!("Invalid log filter for module {module}: {level}"))?;
            filter = filter.add_directive(directive);
        }
    }

    let own = format!("memberships_admin_lib={}", config.level)
        .parse::<Directive>()
        .context("Invalid application log level")?;
    Ok(filter.add_directive(own))
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;

    let file_layer = if config.file_output {
        let log_dir = config.directory.clone().unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let (writer, guard) = non_blocking(rolling::daily(&log_dir, &config.file_name));
        LOG_GUARDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(guard);

        let layer = fmt::Layer::new()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_ansi(false);

        Some(if config.json_format {
            layer
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            layer.with_target(false).boxed()
        })
    } else {
        None
    };

    let console_layer = config.console_output.then(|| {
        let layer = fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false);

        if config.json_format && !config.file_output {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    });

    if file_layer.is_none() && console_layer.is_none() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    info!(
        level = %config.level,
        json = config.json_format,
        console = config.console_output,
        file = config.file_output,
        "Logging system initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_log_directory_is_deterministic() {
        let log_dir = get_log_directory();
        assert!(log_dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_module_filters_are_applied() {
        let config = LoggingConfig::default();
        let filter = build_env_filter(&config).unwrap().to_string();
        if std::env::var("RUST_LOG").is_err() {
            assert!(filter.contains("sqlx=warn"));
            assert!(filter.contains("memberships_admin_lib=info"));
        }
    }

    #[test]
    fn test_bad_module_filter_is_rejected() {
        let mut config = LoggingConfig::default();
        config.module_filters.insert("sqlx".to_string(), "not a level!".to_string());
        if std::env::var("RUST_LOG").is_err() {
            assert!(build_env_filter(&config).is_err());
        }
    }
}
