//! Configuration management module for tiercache
//!
//! Settings are loaded from, in order of increasing priority:
//! 1. Built-in defaults
//! 2. A TOML file (`--config` or `TIERCACHE_CONFIG_FILE`)
//! 3. `TIERCACHE_*` environment variables, `__` separating nested keys

pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

// Re-export public types
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::Settings;
