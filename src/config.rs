//! YAML Configuration File Support for formfit
//!
//! Loads the storage settings of a [`FormRegistry`](crate::FormRegistry) from a
//! single YAML file: which backend holds templates and index entries, how
//! records are compressed, and how hard to retry opening the backend.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! storage:
//!   backend: "redb"
//!   path: "./data/formfit.redb"
//!   compression: "zstd"
//!   compression_level: 3
//!
//! retry:
//!   max_retries: 4
//!   base_delay: 5000
//! ```

use std::fs;
use std::path::Path;

use index::{BackendConfig, CompressionCodec, CompressionConfig, RetryConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct FormfitConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub storage: StorageYamlConfig,

    /// Backend open retry policy; delays are in milliseconds.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl FormfitConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FormfitConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory storage, no retries. Handy for tests.
    pub fn in_memory() -> Self {
        Self {
            retry: RetryConfig::none(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        self.storage.validate()?;
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigLoadError::Validation(
                "retry.backoff_multiplier must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Translate into the store's runtime configuration.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .with_backend(self.storage.backend_config())
            .with_compression(self.storage.compression_config())
            .with_retry(self.retry)
    }
}

impl Default for FormfitConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            storage: StorageYamlConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Storage section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageYamlConfig {
    /// `in_memory` or `redb`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file; required for `redb`.
    #[serde(default)]
    pub path: Option<String>,

    /// `zstd` or `none`.
    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl StorageYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "storage.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.path.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigLoadError::Validation(
                "storage.path is required when backend is 'redb'".to_string(),
            ));
        }

        let valid_compression = ["zstd", "none"];
        if !valid_compression.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "storage.compression must be one of: {valid_compression:?}"
            )));
        }

        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "storage.compression_level must be between 1 and 22".to_string(),
            ));
        }

        Ok(())
    }

    fn backend_config(&self) -> BackendConfig {
        match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        }
    }

    fn compression_config(&self) -> CompressionConfig {
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        CompressionConfig::new(codec, self.compression_level)
    }
}

impl Default for StorageYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            compression: default_compression(),
            compression_level: default_compression_level(),
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}

fn default_compression() -> String {
    "zstd".to_string()
}

fn default_compression_level() -> i32 {
    3
}
