//! Parsing of answers typed at the clarification prompt.

use crate::domain::clarify::ClarifyingQuestion;

/// What one line of input means for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerInput {
    /// Blank line: leave this question unanswered.
    Pass,
    /// `skip`: abandon the remaining questions.
    SkipAll,
    /// Numbered choices, resolved to their text.
    Choices(Vec<String>),
    /// Free text.
    Text(String),
    /// Numbers that do not name a choice; ask again.
    Invalid(String),
}

/// Interprets a line typed for `question`.
///
/// For questions with choices, comma-separated 1-based numbers pick
/// choices. A single-select question keeps only the first number. Anything
/// that is not a number list is taken as free text.
pub fn parse_answer(line: &str, question: &ClarifyingQuestion) -> AnswerInput {
    let line = line.trim();
    if line.is_empty() {
        return AnswerInput::Pass;
    }
    if line.eq_ignore_ascii_case("skip") {
        return AnswerInput::SkipAll;
    }

    let Some(choices) = question.choices.as_deref() else {
        return AnswerInput::Text(line.to_string());
    };

    let numbers: Result<Vec<usize>, _> = line
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<usize>)
        .collect();

    let Ok(numbers) = numbers else {
        return AnswerInput::Text(line.to_string());
    };

    let mut picked: Vec<String> = Vec::new();
    for n in numbers {
        let Some(choice) = n.checked_sub(1).and_then(|i| choices.get(i)) else {
            return AnswerInput::Invalid(format!(
                "Pick numbers between 1 and {}",
                choices.len()
            ));
        };
        if !picked.contains(choice) {
            picked.push(choice.clone());
        }
    }

    if !question.multi {
        picked.truncate(1);
    }
    AnswerInput::Choices(picked)
}

/// Accepts `y`, `yes` and blank (default yes).
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi() -> ClarifyingQuestion {
        ClarifyingQuestion::with_choices(
            "q1",
            "What did you feel?",
            vec!["fear".into(), "awe".into(), "calm".into()],
            true,
        )
    }

    fn single() -> ClarifyingQuestion {
        ClarifyingQuestion::with_choices(
            "q2",
            "Was it day or night?",
            vec!["day".into(), "night".into()],
            false,
        )
    }

    #[test]
    fn blank_passes_and_skip_skips_all() {
        assert_eq!(parse_answer("   ", &multi()), AnswerInput::Pass);
        assert_eq!(parse_answer("SKIP", &multi()), AnswerInput::SkipAll);
    }

    #[test]
    fn numbers_pick_choices() {
        assert_eq!(
            parse_answer("1, 3", &multi()),
            AnswerInput::Choices(vec!["fear".into(), "calm".into()])
        );
    }

    #[test]
    fn repeated_numbers_pick_once() {
        assert_eq!(
            parse_answer("2,2", &multi()),
            AnswerInput::Choices(vec!["awe".into()])
        );
    }

    #[test]
    fn single_select_keeps_first() {
        assert_eq!(
            parse_answer("2,1", &single()),
            AnswerInput::Choices(vec!["night".into()])
        );
    }

    #[test]
    fn out_of_range_is_invalid() {
        assert!(matches!(parse_answer("0", &single()), AnswerInput::Invalid(_)));
        assert!(matches!(parse_answer("3", &single()), AnswerInput::Invalid(_)));
    }

    #[test]
    fn words_are_free_text() {
        assert_eq!(
            parse_answer("somewhere in between", &single()),
            AnswerInput::Text("somewhere in between".into())
        );
        let open = ClarifyingQuestion::open("q3", "Who was there?");
        assert_eq!(parse_answer("2", &open), AnswerInput::Text("2".into()));
    }

    #[test]
    fn yes_defaults() {
        assert!(is_yes(""));
        assert!(is_yes("Y"));
        assert!(!is_yes("no"));
    }
}
