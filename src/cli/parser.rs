//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::build;

/// Inspect and modify a tiercache cache from the command line
#[derive(Parser, Debug)]
#[command(name = "tiercache")]
#[command(about = "Inspect and modify a tiercache cache from the command line")]
#[command(long_about = "
tiercache drives one cache backend (memory, file, redis or redis_cluster)
selected by the configuration file and TIERCACHE_* environment variables.

Values are JSON. Anything that does not parse as JSON is stored as a JSON
string, so `tiercache set greeting hello` stores \"hello\".

EXAMPLES:
    # Store a value in the file cache configured in tiercache.toml
    tiercache --config tiercache.toml set user:1 '{\"name\":\"ada\"}'

    # Store only if absent
    tiercache add lock:job-42 1

    # Read and remove
    tiercache pull lock:job-42

    # Use Redis without a configuration file
    TIERCACHE_CACHE__BACKEND=redis tiercache has user:1
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// TOML file with [logger] and [cache] sections. Overrides
    /// TIERCACHE_CONFIG_FILE. The file must exist and be readable.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    ///
    /// Sets the log level to debug, showing every hit, miss and eviction.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Sets the log level to error. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Store a value, overwriting any existing entry
    Set {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
        /// JSON value; plain text is stored as a string
        value: String,
    },
    /// Store a value only if the key has no fresh entry
    Add {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
        /// JSON value; plain text is stored as a string
        value: String,
    },
    /// Print the value stored under a key
    Get {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Print the value stored under a key and remove it
    Pull {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Print whether a fresh entry exists for a key
    Has {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Remove a key; missing keys are not an error
    Delete {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Remove every entry
    Flush,
}

impl Cli {
    /// Log level implied by --verbose / --quiet, if either is set
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}
