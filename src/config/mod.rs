//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `DREAMSCAPE` prefix
//! and nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use dreamscape::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Writing dreams to {}", config.output.dir.display());
//! ```

mod ai;
mod error;
mod output;

pub use ai::{AiConfig, FALLBACK_KEY_VAR};
pub use error::{ConfigError, ValidationError};
pub use output::{LogFormat, OutputConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model service configuration (Gemini)
    #[serde(default)]
    pub ai: AiConfig,

    /// Export directory and logging
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DREAMSCAPE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Falls back to `GEMINI_API_KEY` for the API key
    ///
    /// # Environment Variable Format
    ///
    /// - `DREAMSCAPE__AI__TEXT_MODEL=gemini-2.5-pro` -> `ai.text_model`
    /// - `DREAMSCAPE__OUTPUT__DIR=/tmp/dreams` -> `output.dir`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DREAMSCAPE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.ai = config
            .ai
            .with_fallback_key(std::env::var(FALLBACK_KEY_VAR).ok());

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.output.validate()?;
        Ok(())
    }
}
