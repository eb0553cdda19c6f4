//! Output and logging configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where dreams are written and how the process logs
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving exported panoramas and scene files
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Log filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutputDir);
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("dreams")
}

fn default_log_level() -> String {
    "info".to_string()
}
