//! ANSI color helpers for terminal output

/// ANSI escape codes
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

use ansi::*;

/// Section heading (magenta, bold)
pub fn heading(text: &str) -> String {
    format!("{}{}{}{}", BOLD, MAGENTA, text, RESET)
}

/// Field label (cyan)
pub fn label(text: &str) -> String {
    format!("{}{}{}", CYAN, text, RESET)
}

pub fn success(msg: &str) -> String {
    format!("{}{}{}", GREEN, msg, RESET)
}

pub fn error(msg: &str) -> String {
    format!("{}{}{}", RED, msg, RESET)
}

pub fn warning(msg: &str) -> String {
    format!("{}{}{}", YELLOW, msg, RESET)
}

/// Secondary text (gray)
pub fn status(msg: &str) -> String {
    format!("{}{}{}", GRAY, msg, RESET)
}

/// Reflective prose (dim italic)
pub fn prose(msg: &str) -> String {
    format!("{}{}{}{}", DIM, ITALIC, msg, RESET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_resets() {
        let text = heading("Dream");
        assert!(text.starts_with(BOLD));
        assert!(text.contains("Dream"));
        assert!(text.ends_with(RESET));
    }
}
