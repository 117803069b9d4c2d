//! Configuration loader for tiercache
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from a TOML file and environment variables with proper
//! precedence.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for the configuration file
const CONFIG_FILE_ENV: &str = "TIERCACHE_CONFIG_FILE";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "TIERCACHE";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

/// Configuration loader
///
/// Sources, lowest priority first:
/// 1. Built-in defaults
/// 2. The configuration file, when one is set (it must exist)
/// 3. `TIERCACHE_*` environment variables
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Configuration file path
    config_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader that reads the file named by `TIERCACHE_CONFIG_FILE`, if set
    pub fn new() -> Self {
        Self {
            config_file: std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from),
        }
    }

    /// Use `path` as the configuration file, overriding `TIERCACHE_CONFIG_FILE`
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Get the configuration file path
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Load and validate configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configured file does not exist
    /// - configuration parsing fails
    /// - configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.config_file {
            Some(path) => Self::add_file_source(builder, path)?,
            None => builder,
        };

        // TIERCACHE_CACHE__BACKEND -> cache.backend
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn add_file_source(builder: Builder, path: &Path) -> Result<Builder, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(true),
        ))
    }

    fn add_env_source(builder: Builder) -> Builder {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CacheBackend;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touching TIERCACHE_* variables must not interleave
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    /// Restores environment variables on drop
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("tiercache.toml");
        fs::write(&path, content).expect("Failed to write config file");
        (temp_dir, path)
    }

    #[test]
    fn test_new_reads_config_file_env() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        env.set("TIERCACHE_CONFIG_FILE", "/path/to/tiercache.toml");
        let loader = ConfigLoader::new();
        assert_eq!(
            loader.config_file(),
            Some(Path::new("/path/to/tiercache.toml"))
        );

        env.remove("TIERCACHE_CONFIG_FILE");
        assert!(ConfigLoader::new().config_file().is_none());
    }

    #[test]
    fn test_load_defaults_without_file() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove("TIERCACHE_CONFIG_FILE");
        env.remove("TIERCACHE_CACHE__BACKEND");
        env.remove("TIERCACHE_CACHE__TTL_SECONDS");

        let settings = ConfigLoader::new().load().expect("defaults should load");
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.cache.ttl_seconds, 0);
        assert_eq!(settings.logger.level, "info");
    }

    #[test]
    fn test_load_file() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove("TIERCACHE_CACHE__BACKEND");
        env.remove("TIERCACHE_CACHE__TTL_SECONDS");

        let (_dir, path) = write_config(
            r#"
[logger]
level = "debug"

[cache]
backend = "file"
ttl_seconds = 5

[cache.file]
directory = "/tmp/tiercache"
"#,
        );

        let settings = ConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(settings.logger.level, "debug");
        assert_eq!(settings.cache.backend, CacheBackend::File);
        assert_eq!(settings.cache.ttl_seconds, 5);
        assert_eq!(settings.cache.file.directory, "/tmp/tiercache");
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let (_dir, path) = write_config(
            r#"
[cache]
backend = "file"
ttl_seconds = 5
"#,
        );

        env.set("TIERCACHE_CACHE__BACKEND", "memory");
        env.set("TIERCACHE_CACHE__TTL_SECONDS", "30");

        let settings = ConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.cache.ttl_seconds, 30);
    }

    #[test]
    fn test_missing_file() {
        let _guard = TEST_MUTEX.lock().unwrap();

        let result = ConfigLoader::new()
            .with_file("/definitely/not/here/tiercache.toml")
            .load();
        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("tiercache.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_settings_fail_validation() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove("TIERCACHE_CACHE__BACKEND");

        let (_dir, path) = write_config(
            r#"
[cache]
backend = "redis_cluster"
"#,
        );

        let result = ConfigLoader::new().with_file(&path).load();
        match result {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "cache.redis_cluster.nodes")
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }
}
