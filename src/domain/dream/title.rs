//! Title sanitizer.
//!
//! The title model is told to return a bare 2-5 word line, and mostly does.
//! When it does not (labels, bullet lists of alternatives, markdown, fenced
//! blocks) this picks the most title-like line. Pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::normalize::{normalize_quotes, strip_code_fences};

/// Returned when no candidate line survives cleaning.
pub const UNTITLED: &str = "Untitled Dream";

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 64;

const MIN_GOOD_WORDS: usize = 2;
const MAX_GOOD_WORDS: usize = 6;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced block regex"));

static EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*?|__|~~").expect("valid emphasis regex"));

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*]\s*").expect("valid bullet regex"));

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[).\]]\s*").expect("valid numbered regex"));

/// `Title:` prefix, or a whole `Here are ...` / `Options: ...` line.
static LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:title\s*:\s*|here are.*$|options?:.*$)").expect("valid label regex")
});

static WRAPPING_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*"|"\s*$"#).expect("valid wrapping quotes regex"));

/// Reduces raw model text to a single-line title of at most 64 characters.
///
/// Never fails and never returns an empty string.
pub fn sanitize_title(raw: &str) -> String {
    let without_blocks = FENCED_BLOCK.replace_all(raw, "");

    let candidates: Vec<String> = without_blocks
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect();

    let pick = candidates
        .iter()
        .find(|line| is_title_like(line))
        .or_else(|| candidates.first())
        .map(String::as_str)
        .unwrap_or(UNTITLED);

    let collapsed = pick.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_TITLE_CHARS).collect();
    let title = truncated.trim_end();

    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

fn clean_line(line: &str) -> String {
    let line = normalize_quotes(line);
    let line = strip_code_fences(&line);
    let line = EMPHASIS.replace_all(&line, "");
    let line = BULLET.replace(&line, "");
    let line = NUMBERED.replace(&line, "");
    let line = LABEL.replace(&line, "");
    let line = WRAPPING_QUOTES.replace_all(&line, "");
    line.trim().to_string()
}

fn is_title_like(line: &str) -> bool {
    let words = line.split_whitespace().count();
    (MIN_GOOD_WORDS..=MAX_GOOD_WORDS).contains(&words) && !line.contains(':')
}
