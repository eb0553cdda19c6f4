//! Scene plan: primitive 3D objects placed around the panorama viewer.
//!
//! The planner model returns loosely-typed records. Everything here is
//! clamped or defaulted so the renderer only ever sees values it can draw.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::normalize::JsonNormalizer;

/// Maximum number of objects kept from a plan.
pub const MAX_SCENE_OBJECTS: usize = 12;

/// Horizontal (x, z) placement bound, in scene units.
pub const HORIZONTAL_LIMIT: f64 = 8.0;

/// Vertical placement range: slightly below the camera up to well above it.
pub const VERTICAL_MIN: f64 = -2.0;
pub const VERTICAL_MAX: f64 = 5.0;

/// Default depth places objects in front of the camera.
pub const DEFAULT_Z: f64 = -2.0;

pub const DEFAULT_COLOR: &str = "#9ca3af";
pub const DEFAULT_METALNESS: f64 = 0.2;
pub const DEFAULT_ROUGHNESS: f64 = 0.6;

/// Primitive geometry the renderer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveShape {
    #[default]
    Box,
    Sphere,
    Torus,
    Cone,
    Cylinder,
    Icosahedron,
    Dodecahedron,
    Plane,
}

impl PrimitiveShape {
    /// Parses a shape tag, ignoring case and surrounding whitespace.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "box" | "cube" => Some(Self::Box),
            "sphere" => Some(Self::Sphere),
            "torus" => Some(Self::Torus),
            "cone" => Some(Self::Cone),
            "cylinder" => Some(Self::Cylinder),
            "icosahedron" => Some(Self::Icosahedron),
            "dodecahedron" => Some(Self::Dodecahedron),
            "plane" => Some(Self::Plane),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Torus => "torus",
            Self::Cone => "cone",
            Self::Cylinder => "cylinder",
            Self::Icosahedron => "icosahedron",
            Self::Dodecahedron => "dodecahedron",
            Self::Plane => "plane",
        };
        write!(f, "{}", s)
    }
}

/// Idle animation applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    #[default]
    None,
    Rotate,
    Float,
    Orbit,
}

impl Animation {
    /// Parses an animation tag, ignoring case and surrounding whitespace.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "rotate" => Some(Self::Rotate),
            "float" => Some(Self::Float),
            "orbit" => Some(Self::Orbit),
            _ => None,
        }
    }
}

/// Uniform or per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scale {
    Uniform(f64),
    Axes([f64; 3]),
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Uniform(1.0)
    }
}

/// One primitive placed in the dream scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    #[serde(rename = "type")]
    pub shape: PrimitiveShape,
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: Scale,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive: Option<String>,
    pub metalness: f64,
    pub roughness: f64,
    pub animation: Animation,
}

/// Clamps and defaults a parsed scene plan.
///
/// Keeps at most the first 12 records; non-object records are sanitized as
/// if every field were missing.
pub fn sanitize_scene(records: &[Value]) -> Vec<SceneObject> {
    records
        .iter()
        .take(MAX_SCENE_OBJECTS)
        .enumerate()
        .map(|(index, record)| sanitize_object(index, record))
        .collect()
}

/// Normalizes planner output and sanitizes it.
///
/// Accepts a bare array or an object wrapping the array under `objects`.
/// Returns `None` when no plan can be recovered.
pub fn plan_from_text<N: JsonNormalizer>(normalizer: &N, raw: &str) -> Option<Vec<SceneObject>> {
    let parsed: Value = normalizer.normalize(raw)?;
    let records = match parsed {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("objects") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    Some(sanitize_scene(&records))
}

fn sanitize_object(index: usize, record: &Value) -> SceneObject {
    let field = |name: &str| record.get(name);

    let id = match field("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("obj-{}", index),
    };

    let shape = field("type")
        .or_else(|| field("shape"))
        .and_then(Value::as_str)
        .and_then(PrimitiveShape::parse)
        .unwrap_or_default();

    let [x, y, z] = components(field("position"));
    let position = [
        x.unwrap_or(0.0).clamp(-HORIZONTAL_LIMIT, HORIZONTAL_LIMIT),
        y.unwrap_or(0.0).clamp(VERTICAL_MIN, VERTICAL_MAX),
        z.unwrap_or(DEFAULT_Z).clamp(-HORIZONTAL_LIMIT, HORIZONTAL_LIMIT),
    ];

    let rotation = components(field("rotation")).map(|c| c.unwrap_or(0.0));

    let scale = match field("scale") {
        Some(v @ Value::Number(_)) => finite(v).map(Scale::Uniform).unwrap_or_default(),
        Some(v @ Value::Array(_)) => Scale::Axes(components(Some(v)).map(|c| c.unwrap_or(1.0))),
        _ => Scale::default(),
    };

    let color = non_empty_str(field("color")).unwrap_or_else(|| DEFAULT_COLOR.to_string());
    let emissive = non_empty_str(field("emissive"));

    let metalness = field("metalness")
        .and_then(finite)
        .map_or(DEFAULT_METALNESS, |v| v.clamp(0.0, 1.0));
    let roughness = field("roughness")
        .and_then(finite)
        .map_or(DEFAULT_ROUGHNESS, |v| v.clamp(0.0, 1.0));

    let animation = field("animation")
        .and_then(Value::as_str)
        .and_then(Animation::parse)
        .unwrap_or_default();

    SceneObject {
        id,
        shape,
        position,
        rotation,
        scale,
        color,
        emissive,
        metalness,
        roughness,
        animation,
    }
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Up to three finite numeric components; anything else reads as missing.
fn components(value: Option<&Value>) -> [Option<f64>; 3] {
    let mut out = [None; 3];
    if let Some(Value::Array(items)) = value {
        for (slot, item) in out.iter_mut().zip(items.iter()) {
            *slot = finite(item);
        }
    }
    out
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
