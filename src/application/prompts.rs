//! Prompt text and sampling settings for each model request.

use serde_json::{json, Value};

use crate::domain::clarify::QAEntry;
use crate::domain::dream::DreamDescription;

pub const TITLE_TEMPERATURE: f32 = 0.5;
pub const TITLE_MAX_TOKENS: u32 = 16;
pub const SCENE_TEMPERATURE: f32 = 0.6;
pub const SCENE_MAX_TOKENS: u32 = 300;
pub const QUESTIONS_TEMPERATURE: f32 = 0.4;
pub const ANALYSIS_TEMPERATURE: f32 = 0.5;

/// Thinking budget for the short title and scene requests.
pub const NO_THINKING: u32 = 0;

/// Text as a JSON string literal, quotes and escapes included.
fn quoted(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

pub fn title_prompt(description: &DreamDescription) -> String {
    format!(
        r#"You are titling a dream. Return ONLY the title as a single line.
Rules:
- 2 to 5 words, evocative, no quotes, no markdown, no emojis.
- No prefixes like "Title:", "Option", numbers, or bullets.
- Do not explain. Do not include JSON.

Dream description: {}"#,
        quoted(description.as_str())
    )
}

pub fn panorama_prompt(title: &str, description: &DreamDescription) -> String {
    format!(
        r#"Generate a realistic, high-resolution 360-degree image suitable for a VR experience.
The title of the scene is: "{}".
The scene is based on this description: "{}".

Style guidelines:
- Seamlessly wrappable for a 3D skybox or VR experience.
- Photorealistic.
- The panorama should be seamless, with no visible edges or distortions.

The camera should be positioned at head height, capturing a wide field of view.

The image should be in an equirectangular format with a 2:1 aspect ratio."#,
        title,
        description.as_str()
    )
}

pub fn scene_prompt(title: &str, description: &DreamDescription) -> String {
    format!(
        r#"You are a 3D scene planner. Based on the dream title and description, return a concise JSON array of objects to place in a 3D scene using primitives only. Use keys: type (box|sphere|torus|cone|cylinder|icosahedron|dodecahedron|plane), position [x,y,z], rotation [x,y,z] (optional, radians), scale (number or [x,y,z], optional), color (hex), emissive (hex, optional), metalness 0..1 (optional), roughness 0..1 (optional), animation (none|rotate|float|orbit, optional). Keep values small so objects are around the origin and within -5..5. Return ONLY JSON with no markdown or explanation.

Title: {}
Description: {}"#,
        title,
        description.as_str()
    )
}

pub fn questions_prompt(description: &DreamDescription) -> String {
    format!(
        r#"You're a thoughtful, trauma-informed dream interviewer.
Return up to 3 concise, non-leading questions that could clarify important details of the dream.
If helpful, include "choices" (2-6 short options) and optionally set "multi": true for multiple selection.
Keep each question under 160 characters, avoid assumptions, be kind.
Reply as a pure JSON array with shape: [{{"id":"q1","question":"...","rationale":"...","choices":["..."],"multi":false}}]

Dream: {}"#,
        quoted(description.as_str())
    )
}

pub fn analysis_prompt(description: &DreamDescription, transcript: &[QAEntry]) -> String {
    let transcript_json = Value::Array(
        transcript
            .iter()
            .map(|entry| json!({"question": entry.question, "answer": entry.answer}))
            .collect(),
    );

    format!(
        r#"You're an evidence-based, trauma-informed dream analyst. Combine symbolic, cognitive, cultural, and emotional perspectives.
Given a user's dream description and optional Q&A transcript, produce a structured JSON with:
{{
    "summary": string, // concise overview in 2-3 sentences
    "emotions": string[], // 2-6 core emotions
    "themes": [{{"name": string, "description": string, "strength": 0..1}}],
    "symbols": [{{"symbol": string, "meaning": string, "evidence"?: string}}],
    "likelyFactors": string[], // habits, stressors, life contexts
    "suggestions": string[], // gentle prompts, journaling ideas, rituals
    "confidence": 0..1,
    "narrative": string, // reflective, supportive, surreal yet grounded
    "sleepStage"?: string, // e.g., REM, N2, unknown
    "sensoryModalities"?: string[], // e.g., visual, auditory, kinesthetic, olfactory
    "copingStrategies"?: string[], // concise actionable tips
    "intensity"?: 0..1
}}
Tone: supportive, non-diagnostic, practical. Avoid medical terms or disorders.
Return ONLY JSON with the fields above.

Dream: {}
Transcript: {}"#,
        quoted(description.as_str()),
        transcript_json
    )
}
