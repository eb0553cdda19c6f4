//! Tolerant extraction of structured data from model output.
//!
//! Generative models are asked for "ONLY JSON" and routinely return
//! something else: fenced blocks, a sentence of preamble, smart quotes pasted
//! from a word processor, a trailing comma after the last array element.
//! This module recovers the payload when it plausibly can and otherwise
//! reports "no usable structured data" as `None`. It never raises.
//!
//! Callers go through [`JsonNormalizer`] so that a stricter strategy can
//! replace [`TolerantNormalizer`] without touching call sites.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

/// ```` ```json ... ``` ```` with the payload captured.
static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid fenced json regex"));

/// Any fence marker, with or without the `json` tag.
static FENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid fence marker regex"));

/// A comma followed only by whitespace before a closing brace or bracket.
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

/// Strategy for turning raw model text into a typed value.
pub trait JsonNormalizer: Send + Sync {
    /// Extracts and parses a JSON payload as `T`; `None` when no usable
    /// structured data is present.
    fn normalize<T: DeserializeOwned>(&self, raw: &str) -> Option<T>;
}

/// Best-effort heuristic normalizer (quote repair, fence stripping, brace
/// scanning, trailing-comma removal).
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerantNormalizer;

impl JsonNormalizer for TolerantNormalizer {
    fn normalize<T: DeserializeOwned>(&self, raw: &str) -> Option<T> {
        normalize(raw)
    }
}

/// Parses the JSON payload embedded in `raw` as `T`.
///
/// # Steps
/// 1. Replace typographic quotes with straight quotes
/// 2. Prefer the body of a ```` ```json ```` block; otherwise strip stray
///    fence markers and take the first `{` through the last `}` (widened to
///    the enclosing `[`/`]` when the payload is an array of objects)
/// 3. Remove trailing commas before `}` or `]`
/// 4. Parse, mapping any failure to `None`
///
/// Text without a `{`...`}` pair yields `None`.
pub fn normalize<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let candidate = extract_payload(raw)?;
    let cleaned = remove_trailing_commas(&candidate);
    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Model output did not parse as the expected shape");
            None
        }
    }
}

/// Replaces curly double and single quotes with their ASCII forms.
pub fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Removes every code-fence marker, keeping the fenced content.
pub fn strip_code_fences(s: &str) -> String {
    FENCE_MARKER.replace_all(s, "").into_owned()
}

/// Removes commas that directly precede a closing `}` or `]`.
pub fn remove_trailing_commas(s: &str) -> String {
    TRAILING_COMMA.replace_all(s, "$1").into_owned()
}

/// Locates the JSON payload within model text.
fn extract_payload(raw: &str) -> Option<String> {
    let quoted = normalize_quotes(raw);

    if !has_brace_pair(&quoted) {
        return None;
    }

    if let Some(captures) = FENCED_JSON.captures(&quoted) {
        let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        if has_brace_pair(body) {
            return Some(body.to_string());
        }
    }

    let unfenced = strip_code_fences(&quoted);
    brace_span(unfenced.trim()).map(str::to_string)
}

fn has_brace_pair(s: &str) -> bool {
    matches!((s.find('{'), s.rfind('}')), (Some(first), Some(last)) if last > first)
}

/// First `{` to last `}`. Widened to the surrounding brackets only when they
/// hug the objects or the widened span is itself valid JSON.
fn brace_span(s: &str) -> Option<&str> {
    let first = s.find('{')?;
    let last = s.rfind('}')?;
    if last <= first {
        return None;
    }

    let objects = &s[first..=last];
    let open_bracket = s[..first].rfind('[');
    let close_bracket = s[last..].find(']').map(|i| last + i);
    let (open, close) = match (open_bracket, close_bracket) {
        (Some(open), Some(close)) => (open, close),
        _ => return Some(objects),
    };

    let array = &s[open..=close];
    let hugs_objects = s[open + 1..first].trim().is_empty();
    let parses = serde_json::from_str::<serde_json::Value>(&remove_trailing_commas(array)).is_ok();
    if hugs_objects || parses {
        Some(array)
    } else {
        Some(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Mood {
        name: String,
        level: u8,
    }

    #[test]
    fn parses_clean_json() {
        let mood: Mood = normalize(r#"{"name":"calm","level":2}"#).unwrap();
        assert_eq!(mood, Mood { name: "calm".into(), level: 2 });
    }

    #[test]
    fn fenced_block_with_smart_quotes_and_trailing_commas_matches_clean_parse() {
        let messy = "Sure! Here is the JSON:\n```json\n{\u{201C}name\u{201D}: \u{201C}calm\u{201D}, \u{201C}tags\u{201D}: [\u{201C}a\u{201D}, \u{201C}b\u{201D},],}\n```\nHope it helps.";
        let clean = r#"{"name": "calm", "tags": ["a", "b"]}"#;

        let from_messy: Value = normalize(messy).unwrap();
        let from_clean: Value = serde_json::from_str(clean).unwrap();
        assert_eq!(from_messy, from_clean);
    }

    #[test]
    fn prose_around_object_is_ignored() {
        let raw = "The analysis follows {\"name\":\"fog\",\"level\":4} and that is all.";
        let mood: Mood = normalize(raw).unwrap();
        assert_eq!(mood.name, "fog");
    }

    #[test]
    fn unterminated_fence_still_parses() {
        let raw = "```json\n{\"name\":\"tide\",\"level\":1}";
        let mood: Mood = normalize(raw).unwrap();
        assert_eq!(mood.level, 1);
    }

    #[test]
    fn array_of_objects_keeps_brackets() {
        let raw = "Questions:\n[{\"name\":\"a\",\"level\":1},{\"name\":\"b\",\"level\":2},]\nThanks";
        let moods: Vec<Mood> = normalize(raw).unwrap();
        assert_eq!(moods.len(), 2);
        assert_eq!(moods[1].name, "b");
    }

    #[test]
    fn bracketed_prose_around_object_is_ignored() {
        let raw = "[Note] the result is {\"name\":\"fog\",\"level\":4} [end]";
        let mood: Mood = normalize(raw).unwrap();
        assert_eq!(mood, Mood { name: "fog".into(), level: 4 });
    }

    #[test]
    fn fenced_array_is_preferred_over_outer_text() {
        let raw = "{ignored} ```json\n[{\"name\":\"x\",\"level\":3}]\n```";
        let moods: Vec<Mood> = normalize(raw).unwrap();
        assert_eq!(moods, vec![Mood { name: "x".into(), level: 3 }]);
    }

    #[test]
    fn text_without_braces_is_none() {
        assert_eq!(normalize::<Value>("no json here"), None);
        assert_eq!(normalize::<Value>("[1, 2, 3]"), None);
        assert_eq!(normalize::<Value>("} backwards {"), None);
        assert_eq!(normalize::<Value>(""), None);
    }

    #[test]
    fn malformed_payload_is_none() {
        assert_eq!(normalize::<Value>("{\"name\": }"), None);
    }

    #[test]
    fn shape_mismatch_is_none() {
        assert_eq!(normalize::<Mood>(r#"{"name": 5}"#), None);
    }

    #[test]
    fn trait_delegates_to_tolerant_parse() {
        let normalizer = TolerantNormalizer;
        let value: Value = normalizer.normalize("```json\n{\"a\": 1,}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn helpers_behave_independently() {
        assert_eq!(normalize_quotes("\u{2018}hi\u{2019}"), "'hi'");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "\n{}\n");
        assert_eq!(remove_trailing_commas("[1, 2, ]"), "[1, 2 ]");
        assert_eq!(remove_trailing_commas("{\"a\": 1,\n}"), "{\"a\": 1\n}");
    }
}
