//! Configuration management for travelstore.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::validate_key;
use crate::store::{ConsistencyMode, DEFAULT_ENTRIES_KEY};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "travelstore";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TRAVELSTORE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRAVELSTORE_`, nested keys
///    separated by `__`, e.g. `TRAVELSTORE_STORAGE__ENTRIES_KEY`)
/// 2. TOML config file at `~/.config/travelstore/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the key-value files.
    /// Defaults to `~/.local/share/travelstore`
    pub data_dir: Option<PathBuf>,
    /// Key under which the entry collection is stored.
    pub entries_key: String,
    /// Isolation between mutations issued by this process.
    pub consistency: ConsistencyMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Resolved at runtime
            entries_key: DEFAULT_ENTRIES_KEY.to_string(),
            consistency: ConsistencyMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation
    /// fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(&config_file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.entries_key.is_empty() {
            return Err(Error::ConfigValidation {
                message: "entries_key must not be empty".to_string(),
            });
        }

        validate_key(&self.storage.entries_key).map_err(|e| Error::ConfigValidation {
            message: format!("entries_key: {e}"),
        })?;

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.storage.entries_key, "entries");
        assert_eq!(config.storage.consistency, ConsistencyMode::BestEffort);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_key() {
        let mut config = Config::default();
        config.storage.entries_key = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_validate_unsafe_key() {
        let mut config = Config::default();
        config.storage.entries_key = "../entries".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("entries_key"));
    }

    #[test]
    fn test_data_dir_default() {
        let config = Config::default();
        assert!(config.data_dir().to_string_lossy().contains("travelstore"));
    }

    #[test]
    fn test_data_dir_custom() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/custom/journal"));
        assert_eq!(config.data_dir(), PathBuf::from("/custom/journal"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("travelstore"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Missing file falls back to defaults
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.storage.entries_key, Config::default().storage.entries_key);
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [storage]
                data_dir = "/tmp/journal"
                entries_key = "trips"
                "#,
            )?;
            jail.set_env("TRAVELSTORE_STORAGE__CONSISTENCY", "serialized");

            let config = Config::from_figment(
                Figment::new()
                    .merge(Serialized::defaults(Config::default()))
                    .merge(Toml::file("config.toml"))
                    .merge(Env::prefixed(ENV_PREFIX).split("__")),
            )
            .map_err(|e| e.to_string())?;

            assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/journal")));
            assert_eq!(config.storage.entries_key, "trips");
            assert_eq!(config.storage.consistency, ConsistencyMode::Serialized);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_key_from_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[storage]\nentries_key = \"a/b\"\n")?;
            let result = Config::load_from(Some(PathBuf::from("config.toml")));
            assert!(result.is_err());
            Ok(())
        });
    }

    #[test]
    fn test_storage_config_serialize() {
        let json = serde_json::to_string(&StorageConfig::default()).unwrap();
        assert!(json.contains("entries_key"));
        assert!(json.contains("best_effort"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"entries_key": "journal", "consistency": "serialized"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.entries_key, "journal");
        assert_eq!(storage.consistency, ConsistencyMode::Serialized);
        assert!(storage.data_dir.is_none());
    }
}
