//! Structured dream analysis and its ingestion rules.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UnitInterval;
use crate::domain::normalize::JsonNormalizer;

pub const MAX_EMOTIONS: usize = 6;
pub const MAX_THEMES: usize = 6;
pub const MAX_SYMBOLS: usize = 10;
pub const MAX_FACTORS: usize = 6;
pub const MAX_SUGGESTIONS: usize = 6;

/// Confidence assumed when the analyst omits it.
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Confidence attached to an analysis synthesized from unstructured text.
pub const SYNTHESIZED_CONFIDENCE: f64 = 0.4;

const SYNTHESIZED_SUMMARY_CHARS: usize = 600;
const SYNTHESIZED_SUMMARY_LINES: usize = 3;

pub const UNSTRUCTURED_SUMMARY: &str =
    "A reflective take on your dream could not be structured automatically.";

/// A recurring theme with its perceived strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamTheme {
    pub name: String,
    pub description: String,
    pub strength: UnitInterval,
}

/// A symbol, what it may mean, and what in the dream suggests it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInsight {
    pub symbol: String,
    pub meaning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Analyst output after bounding and clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamAnalysis {
    pub summary: String,
    pub emotions: Vec<String>,
    pub themes: Vec<DreamTheme>,
    pub symbols: Vec<SymbolInsight>,
    pub likely_factors: Vec<String>,
    pub suggestions: Vec<String>,
    pub confidence: UnitInterval,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensory_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coping_strategies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<UnitInterval>,
}

/// Wire shape requested from the analyst. Every field is optional so that
/// partially filled responses still ingest, and a field of the wrong type
/// reads as missing instead of rejecting the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDreamAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::texts")]
    pub emotions: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::records")]
    pub themes: Option<Vec<RawTheme>>,
    #[serde(deserialize_with = "lenient::records")]
    pub symbols: Option<Vec<RawSymbol>>,
    #[serde(deserialize_with = "lenient::texts")]
    pub likely_factors: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::texts")]
    pub suggestions: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::number")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub narrative: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub sleep_stage: Option<String>,
    #[serde(deserialize_with = "lenient::texts")]
    pub sensory_modalities: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::texts")]
    pub coping_strategies: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::number")]
    pub intensity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTheme {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSymbol {
    #[serde(deserialize_with = "lenient::text")]
    pub symbol: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub meaning: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub evidence: Option<String>,
}

/// Field deserializers that turn type mismatches into `None`.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Accepts a number or a numeric string.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite()))
    }

    /// String items of an array; a lone string becomes a one-item list.
    pub fn texts<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) if !s.trim().is_empty() => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::String(s) if !s.trim().is_empty() => Some(vec![s]),
            _ => None,
        })
    }

    /// Array items that parse as `T`; the others are dropped.
    pub fn records<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter(Value::is_object)
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
            ),
            _ => None,
        })
    }
}

impl From<RawDreamAnalysis> for DreamAnalysis {
    fn from(raw: RawDreamAnalysis) -> Self {
        let themes = bounded(raw.themes, MAX_THEMES)
            .into_iter()
            .map(|t| DreamTheme {
                name: t.name.unwrap_or_default(),
                description: t.description.unwrap_or_default(),
                strength: UnitInterval::new(t.strength.unwrap_or(0.0)),
            })
            .collect();

        let symbols = bounded(raw.symbols, MAX_SYMBOLS)
            .into_iter()
            .map(|s| SymbolInsight {
                symbol: s.symbol.unwrap_or_default(),
                meaning: s.meaning.unwrap_or_default(),
                evidence: s.evidence.filter(|e| !e.trim().is_empty()),
            })
            .collect();

        Self {
            summary: raw.summary.unwrap_or_default(),
            emotions: bounded(raw.emotions, MAX_EMOTIONS),
            themes,
            symbols,
            likely_factors: bounded(raw.likely_factors, MAX_FACTORS),
            suggestions: bounded(raw.suggestions, MAX_SUGGESTIONS),
            confidence: UnitInterval::new(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
            narrative: raw.narrative.unwrap_or_default(),
            sleep_stage: raw.sleep_stage.filter(|s| !s.trim().is_empty()),
            sensory_modalities: raw.sensory_modalities,
            coping_strategies: raw.coping_strategies,
            intensity: raw.intensity.map(UnitInterval::new),
        }
    }
}

impl DreamAnalysis {
    /// Ingests analyst output, falling back to a synthesized analysis when
    /// the text holds no usable structure. Never fails.
    pub fn from_model_output<N: JsonNormalizer>(normalizer: &N, raw: &str) -> Self {
        match normalizer.normalize::<RawDreamAnalysis>(raw) {
            Some(parsed) => parsed.into(),
            None => {
                tracing::warn!("Analysis response was not structured, synthesizing a summary");
                Self::synthesize(raw)
            }
        }
    }

    /// Minimal analysis built from free text.
    ///
    /// The summary is the text without leading punctuation, its first three
    /// non-empty lines joined by spaces, capped at 600 characters.
    pub fn synthesize(raw: &str) -> Self {
        let stripped = raw
            .trim()
            .trim_start_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '{' || c == '['));

        let joined = stripped
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(SYNTHESIZED_SUMMARY_LINES)
            .collect::<Vec<_>>()
            .join(" ");

        let summary: String = joined.chars().take(SYNTHESIZED_SUMMARY_CHARS).collect();
        let summary = if summary.trim().is_empty() {
            UNSTRUCTURED_SUMMARY.to_string()
        } else {
            summary
        };

        Self {
            narrative: summary.clone(),
            summary,
            emotions: Vec::new(),
            themes: Vec::new(),
            symbols: Vec::new(),
            likely_factors: Vec::new(),
            suggestions: Vec::new(),
            confidence: UnitInterval::new(SYNTHESIZED_CONFIDENCE),
            sleep_stage: None,
            sensory_modalities: None,
            coping_strategies: None,
            intensity: None,
        }
    }
}

fn bounded<T>(items: Option<Vec<T>>, max: usize) -> Vec<T> {
    let mut items = items.unwrap_or_default();
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::TolerantNormalizer;

    fn ingest(raw: &str) -> DreamAnalysis {
        DreamAnalysis::from_model_output(&TolerantNormalizer, raw)
    }

    #[test]
    fn complete_analysis_is_ingested() {
        let raw = r#"{
            "summary": "A dream about searching.",
            "emotions": ["anxious", "curious"],
            "themes": [{"name": "control", "description": "losing grip", "strength": 0.7}],
            "symbols": [{"symbol": "stairs", "meaning": "progress", "evidence": "endless climb"}],
            "likelyFactors": ["deadlines"],
            "suggestions": ["journal on waking"],
            "confidence": 0.8,
            "narrative": "You climbed and climbed.",
            "sleepStage": "REM",
            "sensoryModalities": ["visual"],
            "copingStrategies": ["breathing"],
            "intensity": 0.5
        }"#;

        let analysis = ingest(raw);
        assert_eq!(analysis.summary, "A dream about searching.");
        assert_eq!(analysis.emotions, vec!["anxious", "curious"]);
        assert_eq!(analysis.themes[0].strength.value(), 0.7);
        assert_eq!(analysis.symbols[0].evidence.as_deref(), Some("endless climb"));
        assert_eq!(analysis.likely_factors, vec!["deadlines"]);
        assert_eq!(analysis.confidence.value(), 0.8);
        assert_eq!(analysis.sleep_stage.as_deref(), Some("REM"));
        assert_eq!(analysis.intensity.map(|i| i.value()), Some(0.5));
    }

    #[test]
    fn lists_are_bounded() {
        let emotions: Vec<String> = (0..9).map(|i| format!("\"e{}\"", i)).collect();
        let symbols: Vec<String> = (0..14)
            .map(|i| format!("{{\"symbol\":\"s{}\",\"meaning\":\"m\"}}", i))
            .collect();
        let raw = format!(
            "{{\"emotions\":[{}],\"symbols\":[{}]}}",
            emotions.join(","),
            symbols.join(",")
        );

        let analysis = ingest(&raw);
        assert_eq!(analysis.emotions.len(), MAX_EMOTIONS);
        assert_eq!(analysis.symbols.len(), MAX_SYMBOLS);
        assert_eq!(analysis.emotions[0], "e0");
    }

    #[test]
    fn missing_confidence_defaults() {
        let analysis = ingest(r#"{"summary": "short"}"#);
        assert_eq!(analysis.confidence.value(), DEFAULT_CONFIDENCE);
        assert!(analysis.emotions.is_empty());
        assert!(analysis.intensity.is_none());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let raw = r#"{"confidence": 1.7, "intensity": -0.3,
            "themes": [{"name": "flight", "description": "", "strength": 4}]}"#;
        let analysis = ingest(raw);
        assert_eq!(analysis.confidence.value(), 1.0);
        assert_eq!(analysis.intensity.map(|i| i.value()), Some(0.0));
        assert_eq!(analysis.themes[0].strength.value(), 1.0);
    }

    #[test]
    fn fenced_analysis_with_trailing_commas_is_ingested() {
        let raw = "Here you go:\n```json\n{\"summary\": \"Water everywhere.\", \"emotions\": [\"calm\",],}\n```";
        let analysis = ingest(raw);
        assert_eq!(analysis.summary, "Water everywhere.");
        assert_eq!(analysis.emotions, vec!["calm"]);
    }

    #[test]
    fn unstructured_text_is_synthesized() {
        let raw = "** Your dream suggests change.\n\nYou may feel unsettled.\nTry journaling.\nMore detail here.";
        let analysis = ingest(raw);
        assert_eq!(
            analysis.summary,
            "Your dream suggests change. You may feel unsettled. Try journaling."
        );
        assert_eq!(analysis.narrative, analysis.summary);
        assert_eq!(analysis.confidence.value(), SYNTHESIZED_CONFIDENCE);
        assert!(analysis.themes.is_empty());
    }

    #[test]
    fn synthesized_summary_is_capped() {
        let raw = "a".repeat(900);
        let analysis = DreamAnalysis::synthesize(&raw);
        assert_eq!(analysis.summary.chars().count(), 600);
    }

    #[test]
    fn empty_text_gets_placeholder_summary() {
        let analysis = DreamAnalysis::synthesize("  ---  ");
        assert_eq!(analysis.summary, UNSTRUCTURED_SUMMARY);
        assert_eq!(analysis.narrative, UNSTRUCTURED_SUMMARY);
    }

    #[test]
    fn loosely_typed_fields_keep_the_structure() {
        let raw = r#"{
            "summary": "Lost at sea.",
            "emotions": ["fear", 3, "relief"],
            "themes": [{"name": "drift", "strength": "0.9"}, "not a theme"],
            "symbols": {"symbol": "boat"},
            "suggestions": "rest",
            "confidence": "0.8",
            "intensity": "high"
        }"#;

        let analysis = ingest(raw);
        assert_eq!(analysis.summary, "Lost at sea.");
        assert_eq!(analysis.emotions, vec!["fear", "relief"]);
        assert_eq!(analysis.themes.len(), 1);
        assert_eq!(analysis.themes[0].strength.value(), 0.9);
        assert!(analysis.symbols.is_empty());
        assert_eq!(analysis.suggestions, vec!["rest"]);
        assert_eq!(analysis.confidence.value(), 0.8);
        assert!(analysis.intensity.is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let analysis = ingest(r#"{"likelyFactors": ["stress"], "sleepStage": "N2"}"#);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["likelyFactors"][0], "stress");
        assert_eq!(json["sleepStage"], "N2");
        assert!(json.get("intensity").is_none());
    }
}
