//! Clarifying questions proposed by the interviewer model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::normalize::JsonNormalizer;

/// Maximum number of questions asked per dream.
pub const MAX_QUESTIONS: usize = 3;

/// Maximum number of choices offered for a single question.
pub const MAX_CHOICES: usize = 8;

/// A question asked before analysis, optionally multiple-choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub multi: bool,
}

impl ClarifyingQuestion {
    /// Free-text question.
    pub fn open(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            rationale: None,
            choices: None,
            multi: false,
        }
    }

    /// Question answered by picking one (or, with `multi`, several) choices.
    pub fn with_choices(
        id: impl Into<String>,
        question: impl Into<String>,
        choices: Vec<String>,
        multi: bool,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            rationale: None,
            choices: Some(choices),
            multi,
        }
    }

    pub fn has_choices(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn offers(&self, choice: &str) -> bool {
        self.choices
            .as_ref()
            .is_some_and(|c| c.iter().any(|offered| offered == choice))
    }
}

/// Normalizes interviewer output into at most three questions.
///
/// Unusable output yields an empty list, which lets clarification complete
/// immediately.
pub fn questions_from_text<N: JsonNormalizer>(normalizer: &N, raw: &str) -> Vec<ClarifyingQuestion> {
    match normalizer.normalize::<Value>(raw) {
        Some(value) => questions_from_value(value),
        None => {
            tracing::debug!("Question response held no structured data");
            Vec::new()
        }
    }
}

/// Ingests parsed interviewer output.
///
/// Accepts a bare array or `{"questions": [...]}`. Keeps the first three
/// records, drops those without question text, caps choices at eight and
/// keeps ids unique by assigning `q<n>` where an id is missing or repeated.
pub fn questions_from_value(value: Value) -> Vec<ClarifyingQuestion> {
    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut questions = Vec::new();

    for (index, record) in records.iter().take(MAX_QUESTIONS).enumerate() {
        let Some(question) = text(record.get("question")) else {
            continue;
        };

        let id = match text(record.get("id")) {
            Some(id) if !seen.contains(&id) => id,
            _ => next_free_id(index + 1, &seen),
        };
        seen.insert(id.clone());

        let choices = record.get("choices").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|c| text(Some(c)))
                .take(MAX_CHOICES)
                .collect::<Vec<_>>()
        });

        questions.push(ClarifyingQuestion {
            id,
            question,
            rationale: text(record.get("rationale")),
            choices: choices.filter(|c| !c.is_empty()),
            multi: record.get("multi").and_then(Value::as_bool).unwrap_or(false),
        });
    }

    questions
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn next_free_id(start: usize, seen: &HashSet<String>) -> String {
    (start..)
        .map(|n| format!("q{}", n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| format!("q{}", start))
}
