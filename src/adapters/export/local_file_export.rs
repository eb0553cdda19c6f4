//! Local Filesystem Export Adapter - Implementation of DreamExporter.
//!
//! Writes the decoded panorama and a JSON scene description side by side so
//! an external viewer can render the dream.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::dream::{DreamAnalysis, GeneratedDream, SceneObject};
use crate::domain::foundation::Timestamp;
use crate::ports::{DreamExporter, ExportError, ExportedDream};

/// Exports dreams into a flat output directory.
///
/// # Directory Structure
///
/// ```text
/// {output_dir}/
/// ├── 20261016-213000-glass-tide-harbor.png
/// └── 20261016-213000-glass-tide-harbor.scene.json
/// ```
///
/// # Atomic Writes
///
/// Each file is written to `{name}.tmp`, synced, then renamed into place,
/// so a viewer watching the directory never sees a partial file.
#[derive(Debug, Clone)]
pub struct LocalFileExporter {
    output_dir: PathBuf,
}

impl LocalFileExporter {
    /// Creates an exporter writing into `output_dir` (created on demand).
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File stem shared by both files of one dream.
    fn stem(dream: &GeneratedDream) -> String {
        format!("{}-{}", dream.created_at.file_stamp(), dream.slug())
    }

    async fn ensure_output_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            ExportError::io(format!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })
    }
}

/// Writes `bytes` to `path` through a temp file and rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = fs::File::create(&temp_path).await.map_err(|e| {
        ExportError::io(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.write_all(bytes).await.map_err(|e| {
        ExportError::io(format!(
            "Failed to write to temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.sync_all().await.map_err(|e| {
        ExportError::io(format!(
            "Failed to sync temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    fs::rename(&temp_path, path).await.map_err(|e| {
        ExportError::io(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })
}

/// Scene file contents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneDocument<'a> {
    title: &'a str,
    created_at: &'a Timestamp,
    /// Panorama file name, relative to the scene file.
    image: String,
    mime_type: &'a str,
    scene_objects: &'a [SceneObject],
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a DreamAnalysis>,
}

#[async_trait]
impl DreamExporter for LocalFileExporter {
    async fn export(
        &self,
        dream: &GeneratedDream,
        analysis: Option<&DreamAnalysis>,
    ) -> Result<ExportedDream, ExportError> {
        let bytes = dream.image.decode()?;
        self.ensure_output_dir().await?;

        let stem = Self::stem(dream);
        let image_name = format!("{}.{}", stem, dream.image.extension());
        let image_path = self.output_dir.join(&image_name);
        let scene_path = self.output_dir.join(format!("{}.scene.json", stem));

        let document = SceneDocument {
            title: &dream.title,
            created_at: &dream.created_at,
            image: image_name,
            mime_type: &dream.image.mime_type,
            scene_objects: dream.scene_objects.as_deref().unwrap_or_default(),
            analysis,
        };
        let scene_json = serde_json::to_vec_pretty(&document)?;

        write_atomic(&image_path, &bytes).await?;
        write_atomic(&scene_path, &scene_json).await?;

        tracing::info!(
            image = %image_path.display(),
            scene = %scene_path.display(),
            objects = dream.object_count(),
            "Exported dream"
        );

        Ok(ExportedDream::new(image_path, scene_path))
    }
}
