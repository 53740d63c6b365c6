//! Session-log line normalization.
//!
//! Terminal captures carry artifacts the grammars should never see: ANSI
//! escape sequences, carriage returns, and the pager prompt a device prints
//! between screens (`  ---- More ----` followed by a cursor-back escape).

use regex::Regex;
use std::sync::LazyLock;

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile"));
static PAGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-{2,4}\s*More\s*-{2,4}(?:\x1b\[\d+D)?(?:\s*\x1b\[\d+D)?")
        .expect("static regex must compile")
});
static OVERSTRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));

/// Normalizes one captured line.
///
/// # Examples
///
/// ```
/// use netlog_parser::normalize::normalize_line;
///
/// assert_eq!(normalize_line("  ---- More ----\x1b[42D10.0.0.1  4  65000\r"), "10.0.0.1  4  65000");
/// assert_eq!(normalize_line("\x1b[1mUp\x1b[0m  "), "Up");
/// ```
pub fn normalize_line(raw: &str) -> String {
    let without_pager = PAGER_RE.replace(raw, "");
    let stripped = ANSI_RE.replace_all(&without_pager, "");
    let mut cleaned = stripped.into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    cleaned
        .trim_end_matches(['\r', '\n'])
        .trim_end()
        .to_string()
}

/// Splits captured text into normalized lines.
pub fn normalize_text(raw: &str) -> Vec<String> {
    raw.replace("\r\n", "\n")
        .split('\n')
        .map(normalize_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_prompt_is_removed() {
        assert_eq!(
            normalize_line("  ---- More ----\x1b[16D                \x1b[16DGE0/0/2  up"),
            "GE0/0/2  up"
        );
    }

    #[test]
    fn test_pager_prompt_keeps_content_indentation() {
        assert_eq!(
            normalize_line("  ---- More ----\x1b[16D                \x1b[16D     10/-"),
            "     10/-"
        );
    }

    #[test]
    fn test_overstrike_is_removed() {
        assert_eq!(normalize_line("a\x08b"), "b");
    }

    #[test]
    fn test_leading_whitespace_is_kept() {
        assert_eq!(normalize_line("   0.0.0.0/0   Static"), "   0.0.0.0/0   Static");
    }

    #[test]
    fn test_normalize_text_splits_crlf() {
        let lines = normalize_text("a\r\nb\nc");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }
}
