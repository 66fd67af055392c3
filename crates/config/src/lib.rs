//! Configuration management for the legal voice backend
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (NYAYA_ prefix, `__` section separator)
//!
//! Secrets (the upstream API token) are only ever read from the
//! environment, never from files.

pub mod settings;

pub use settings::{
    load_settings, LimitsConfig, ObservabilityConfig, ServerConfig, Settings, StorageConfig,
    UpstreamConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
