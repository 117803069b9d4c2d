//! CLI module for tiercache
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration loading with CLI overrides
//! - Command execution against the configured cache

pub mod executor;
pub mod parser;
pub mod validation;

// Re-export public types for convenience
pub use executor::execute_command;
pub use parser::{Cli, Commands};

use crate::config::{ConfigLoader, Settings};

/// Load configuration and apply CLI overrides
///
/// The `--config` path takes precedence over `TIERCACHE_CONFIG_FILE`;
/// `--verbose` and `--quiet` override the configured log level.
///
/// # Errors
/// Returns error if configuration loading or validation fails
pub fn load_config(cli: &Cli) -> anyhow::Result<Settings> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().with_file(path),
        None => ConfigLoader::new(),
    };

    let mut settings = loader.load()?;
    if let Some(level) = cli.log_level_override() {
        settings.logger.level = level.to_string();
    }

    Ok(settings)
}
