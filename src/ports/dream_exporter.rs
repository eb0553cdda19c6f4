//! Dream Exporter Port - Hands finished dreams to the viewer.
//!
//! The panorama viewer and object renderer live outside this crate. They
//! consume a finished dream as files: the decoded panorama image and a JSON
//! scene description. Exported files are display output; nothing here reads
//! them back.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::dream::{DreamAnalysis, GeneratedDream};

/// Port for writing a finished dream where the viewer can pick it up.
///
/// # Contract
///
/// Implementations must:
/// - Write atomically (no partial files on failure)
/// - Never overwrite an earlier export of a different dream
///
/// # File Organization
///
/// ```text
/// {output_dir}/{stamp}-{slug}.{ext}
/// {output_dir}/{stamp}-{slug}.scene.json
/// ```
#[async_trait]
pub trait DreamExporter: Send + Sync {
    /// Writes the panorama and the scene description.
    ///
    /// The scene file also carries the title and, when present, the
    /// analysis, so a viewer can show both next to the panorama.
    async fn export(
        &self,
        dream: &GeneratedDream,
        analysis: Option<&DreamAnalysis>,
    ) -> Result<ExportedDream, ExportError>;
}

/// Paths written by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDream {
    /// Decoded panorama image.
    pub image_path: PathBuf,
    /// Scene description JSON.
    pub scene_path: PathBuf,
}

impl ExportedDream {
    pub fn new(image_path: impl Into<PathBuf>, scene_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            scene_path: scene_path.into(),
        }
    }

    /// Directory both files were written to.
    pub fn directory(&self) -> Option<&Path> {
        self.image_path.parent()
    }
}

/// Errors that can occur while exporting.
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    /// Permission denied writing the file.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// IO error during file operation.
    #[error("IO error: {message}")]
    Io { message: String },

    /// The image payload was not valid base64.
    #[error("Image payload could not be decoded: {message}")]
    InvalidImage { message: String },

    /// The scene description could not be serialized.
    #[error("Scene description could not be serialized: {message}")]
    Serialization { message: String },
}

impl ExportError {
    /// Creates a permission denied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ExportError::permission_denied(err.to_string()),
            _ => ExportError::io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<base64::DecodeError> for ExportError {
    fn from(err: base64::DecodeError) -> Self {
        ExportError::invalid_image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_dream_directory() {
        let exported = ExportedDream::new("/tmp/dreams/a.png", "/tmp/dreams/a.scene.json");
        assert_eq!(exported.directory(), Some(Path::new("/tmp/dreams")));
    }

    #[test]
    fn io_errors_map_by_kind() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            ExportError::from(denied),
            ExportError::PermissionDenied { .. }
        ));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(matches!(ExportError::from(other), ExportError::Io { .. }));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ExportError::invalid_image("bad byte").to_string(),
            "Image payload could not be decoded: bad byte"
        );
    }
}
