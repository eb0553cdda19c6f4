//! Dream content: description, generated image, title, scene plan and analysis.

pub mod analysis;
pub mod description;
pub mod image;
pub mod scene;
pub mod title;

pub use analysis::{
    DreamAnalysis, DreamTheme, RawDreamAnalysis, SymbolInsight, DEFAULT_CONFIDENCE,
    SYNTHESIZED_CONFIDENCE,
};
pub use description::DreamDescription;
pub use image::{DreamImage, GeneratedDream};
pub use scene::{
    plan_from_text, sanitize_scene, Animation, PrimitiveShape, Scale, SceneObject,
    MAX_SCENE_OBJECTS,
};
pub use title::{sanitize_title, MAX_TITLE_CHARS, UNTITLED};
