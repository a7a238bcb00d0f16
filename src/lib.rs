//! Memberships Admin - association maintenance for a memberships catalog
//!
//! Lists products, product/item links and subscription/product links as
//! admin view models, and rewrites a link from one key pair to another as a
//! single atomic swap.

// Module declarations
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::debug;

use crate::commands::{AppState, USAGE, dispatch};
use crate::infrastructure::{ConfigManager, DatabaseConnection, init_logging_with_config};

/// Load configuration, open the database and run one command, printing the
/// JSON result on stdout
pub async fn run(args: Vec<String>) -> Result<()> {
    let (config_path, command) = split_config_arg(args)?;
    if command.is_empty() || command[0] == "--help" || command[0] == "-h" {
        bail!(USAGE);
    }

    let config = ConfigManager::new(config_path)
        .load()
        .context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;

    let database = DatabaseConnection::with_config(&config.database).await?;
    database.migrate().await?;
    debug!(url = %config.database.url, "Database ready");

    let state = AppState::new(database.pool().clone(), &config.admin);
    let value = dispatch(&state, &command).await.map_err(anyhow::Error::msg)?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Pull `--config <path>` out of the argument list
fn split_config_arg(args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>)> {
    let mut config_path = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config requires a path")?;
            config_path = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }

    Ok((config_path, rest))
}
