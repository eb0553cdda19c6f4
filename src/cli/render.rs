//! Text rendering of questions, analyses and results.

use std::fmt::Write;

use super::colors;
use crate::domain::clarify::ClarifyingQuestion;
use crate::domain::dream::{DreamAnalysis, GeneratedDream};
use crate::domain::session::DreamError;
use crate::ports::ExportedDream;

pub fn question(index: usize, question: &ClarifyingQuestion) -> String {
    let mut out = format!("{} {}", colors::label(&format!("{}.", index + 1)), question.question);
    if let Some(rationale) = &question.rationale {
        let _ = write!(out, "\n   {}", colors::status(rationale));
    }
    if let Some(choices) = &question.choices {
        for (i, choice) in choices.iter().enumerate() {
            let _ = write!(out, "\n   {}) {}", i + 1, choice);
        }
        let hint = if question.multi {
            "numbers separated by commas, or your own words"
        } else {
            "a number, or your own words"
        };
        let _ = write!(out, "\n   {}", colors::status(hint));
    }
    out
}

pub fn analysis(analysis: &DreamAnalysis) -> String {
    let mut out = colors::heading("Dream analysis");
    let _ = write!(out, "\n{}", analysis.summary);

    list(&mut out, "Emotions", &analysis.emotions);
    if !analysis.themes.is_empty() {
        let _ = write!(out, "\n{}", colors::label("Themes"));
        for theme in &analysis.themes {
            let _ = write!(
                out,
                "\n  - {} ({}%): {}",
                theme.name,
                theme.strength.as_percent(),
                theme.description
            );
        }
    }
    if !analysis.symbols.is_empty() {
        let _ = write!(out, "\n{}", colors::label("Symbols"));
        for symbol in &analysis.symbols {
            let _ = write!(out, "\n  - {}: {}", symbol.symbol, symbol.meaning);
            if let Some(evidence) = &symbol.evidence {
                let _ = write!(out, " {}", colors::status(&format!("({})", evidence)));
            }
        }
    }
    list(&mut out, "Likely factors", &analysis.likely_factors);
    list(&mut out, "Suggestions", &analysis.suggestions);
    if let Some(strategies) = &analysis.coping_strategies {
        list(&mut out, "Coping strategies", strategies);
    }
    if let Some(modalities) = &analysis.sensory_modalities {
        list(&mut out, "Senses", modalities);
    }
    if let Some(stage) = &analysis.sleep_stage {
        let _ = write!(out, "\n{} {}", colors::label("Sleep stage:"), stage);
    }
    if let Some(intensity) = analysis.intensity {
        let _ = write!(out, "\n{} {}%", colors::label("Intensity:"), intensity.as_percent());
    }
    if !analysis.narrative.is_empty() && analysis.narrative != analysis.summary {
        let _ = write!(out, "\n\n{}", colors::prose(&analysis.narrative));
    }
    let _ = write!(
        out,
        "\n{}",
        colors::status(&format!("confidence {}%", analysis.confidence.as_percent()))
    );
    out
}

pub fn dream(dream: &GeneratedDream, exported: Option<&ExportedDream>) -> String {
    let mut out = colors::heading(&dream.title);
    let objects = match dream.object_count() {
        0 => "panorama only".to_string(),
        1 => "1 scene object".to_string(),
        n => format!("{} scene objects", n),
    };
    let _ = write!(out, "\n{}", colors::status(&format!("{}, {}", dream.image.mime_type, objects)));
    if let Some(exported) = exported {
        let _ = write!(
            out,
            "\n{} {}\n{} {}",
            colors::label("Panorama:"),
            exported.image_path.display(),
            colors::label("Scene:"),
            exported.scene_path.display()
        );
    }
    out
}

/// Advisory errors are warnings; the rest are errors.
pub fn dream_error(error: DreamError) -> String {
    if error.is_advisory() {
        colors::warning(&error.to_string())
    } else {
        colors::error(&error.to_string())
    }
}

fn list(out: &mut String, title: &str, items: &[String]) {
    if !items.is_empty() {
        let _ = write!(out, "\n{} {}", colors::label(&format!("{}:", title)), items.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dream::{DreamImage, DreamTheme, RawDreamAnalysis};
    use crate::domain::foundation::UnitInterval;

    #[test]
    fn question_lists_numbered_choices() {
        let q = ClarifyingQuestion::with_choices(
            "q1",
            "Day or night?",
            vec!["day".into(), "night".into()],
            false,
        );
        let text = question(0, &q);
        assert!(text.contains("Day or night?"));
        assert!(text.contains("1) day"));
        assert!(text.contains("2) night"));
        assert!(text.contains("a number"));
    }

    #[test]
    fn open_question_has_no_hint() {
        let text = question(2, &ClarifyingQuestion::open("q3", "Who was there?"));
        assert!(text.contains("3."));
        assert!(!text.contains("number"));
    }

    #[test]
    fn analysis_shows_themes_and_confidence() {
        let mut insight = DreamAnalysis::from(RawDreamAnalysis {
            summary: Some("A search for home.".into()),
            emotions: Some(vec!["longing".into(), "hope".into()]),
            confidence: Some(0.75),
            ..Default::default()
        });
        insight.themes.push(DreamTheme {
            name: "Belonging".into(),
            description: "Looking for a place".into(),
            strength: UnitInterval::new(0.8),
        });

        let text = analysis(&insight);
        assert!(text.contains("A search for home."));
        assert!(text.contains("longing, hope"));
        assert!(text.contains("Belonging (80%)"));
        assert!(text.contains("confidence 75%"));
    }

    #[test]
    fn dream_without_objects() {
        let generated =
            GeneratedDream::new(DreamImage::new("image/png", "AAAA"), "Salt Moon".into(), None);
        let text = dream(&generated, None);
        assert!(text.contains("Salt Moon"));
        assert!(text.contains("panorama only"));
    }

    #[test]
    fn advisory_errors_are_yellow() {
        assert!(dream_error(DreamError::AnalysisFailed).starts_with(colors::ansi::YELLOW));
        assert!(dream_error(DreamError::SafetyBlocked).starts_with(colors::ansi::RED));
    }
}
