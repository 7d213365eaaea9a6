//! Configuration management for the voice orchestration layer
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (AIDY_ prefix, `__` separator)
//!
//! Credentials for hosted providers are resolved from the environment at
//! startup; a missing required credential is a fatal configuration error.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, Credentials, LlmConfig, ObservabilityConfig, PathsConfig, RagConfig,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required credential: {0} must be set in the environment")]
    MissingCredential(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
