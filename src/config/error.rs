//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout (expected 1..=600 seconds)")]
    InvalidTimeout,

    #[error("Model name must not be empty: {0}")]
    EmptyModel(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid log format: {0} (expected pretty or json)")]
    InvalidLogFormat(String),

    #[error("Output directory must not be empty")]
    EmptyOutputDir,
}
