//! Generative model service configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};

/// Environment variable consulted when no prefixed key is set.
pub const FALLBACK_KEY_VAR: &str = "GEMINI_API_KEY";

const MAX_TIMEOUT_SECS: u64 = 600;

/// Gemini configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API key
    pub gemini_api_key: Option<Secret<String>>,

    /// API root, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for titles, scene plans, questions and analyses
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model for panoramas
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Fills the key from `GEMINI_API_KEY` when the prefixed one is absent.
    pub fn with_fallback_key(mut self, fallback: Option<String>) -> Self {
        if !self.has_api_key() {
            self.gemini_api_key = fallback.filter(|k| !k.trim().is_empty()).map(Secret::new);
        }
        self
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired(FALLBACK_KEY_VAR));
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.text_model.trim().is_empty() {
            return Err(ValidationError::EmptyModel("text_model"));
        }
        if self.image_model.trim().is_empty() {
            return Err(ValidationError::EmptyModel("image_model"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }

        Ok(())
    }

    /// Adapter configuration, or `None` without an API key.
    pub fn gemini(&self) -> Option<GeminiConfig> {
        let key = self.gemini_api_key.as_ref()?;
        Some(
            GeminiConfig::new(key.expose_secret().trim())
                .with_base_url(self.base_url.clone())
                .with_text_model(self.text_model.clone())
                .with_image_model(self.image_model.clone())
                .with_timeout(self.timeout()),
        )
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_timeout() -> u64 {
    120
}
