//! Generated panorama image and the finished dream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::scene::SceneObject;
use crate::domain::foundation::Timestamp;

/// Inline image payload as returned by the image model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl DreamImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// `data:<mime>;base64,<data>` URL for viewers that accept one.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.trim())
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        let subtype = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match subtype.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// A finished dream: the panorama, its title and an optional scene plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDream {
    pub image: DreamImage,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_objects: Option<Vec<SceneObject>>,
    pub created_at: Timestamp,
}

impl GeneratedDream {
    pub fn new(image: DreamImage, title: String, scene_objects: Option<Vec<SceneObject>>) -> Self {
        Self {
            image,
            title,
            scene_objects,
            created_at: Timestamp::now(),
        }
    }

    pub fn object_count(&self) -> usize {
        self.scene_objects.as_ref().map_or(0, Vec::len)
    }

    /// Lowercase, hyphen-separated form of the title for file names.
    pub fn slug(&self) -> String {
        let slug = self
            .title
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            "dream".to_string()
        } else {
            slug
        }
    }
}
