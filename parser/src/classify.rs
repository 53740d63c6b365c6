//! Line classification shared by every grammar.
//!
//! Separates device noise ("garbage": banners, error echoes, timestamps,
//! separator rules) from content a grammar failed to understand, and
//! recognizes the prompt lines that mark the boundary between commands.

use regex::Regex;
use std::sync::LazyLock;

struct ClassifyPatterns {
    garbage: Vec<Regex>,
    prompt: Regex,
}

static PATTERNS: LazyLock<ClassifyPatterns> = LazyLock::new(ClassifyPatterns::new);

impl ClassifyPatterns {
    fn new() -> Self {
        // All regexes here are compile-time constants. An expect() failure indicates
        // a programmer error in the pattern, not a runtime condition.
        let garbage = [
            // Error: Unrecognized command found at '^' position.
            r"^\s*(?:Error|Info|Warning|Notice)\s*:",
            // % Incomplete command found at '^' position.
            r"^\s*%\s*\S",
            r"^\s*\^\s*$",
            // 2024-01-15 10:22:33+08:00 / 2024-01-15 10:22:33.123
            r"^\s*\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:\s*[+-]\d{2}:\d{2})?(?:\s+DST)?\s*$",
            // Jan 15 2024 10:22:33+08:00
            r"^\s*[A-Z][a-z]{2}\s+\d{1,2}\s+\d{4}\s+\d{2}:\d{2}:\d{2}(?:[+-]\d{2}:\d{2})?\s*$",
            r"^\s*[-=_*]{5,}\s*$",
            r"^\s*-{2,4}\s*More\s*-{2,4}\s*$",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("static regex must compile"))
        .collect();

        Self {
            garbage,
            // <R1>display arp / [~R1-GigabitEthernet0/0/1] / R1#show arp
            prompt: Regex::new(
                r"^\s*(?:<(?P<angle>[A-Za-z0-9][\w.\-:/@]*)>|\[[~*]?(?P<square>[A-Za-z0-9][\w.\-:/@]*)\]|(?P<hash>[A-Za-z][\w.\-]*)[#>])(?P<command>.*)$",
            )
            .expect("static regex must compile"),
        }
    }
}

/// How the engine classified a line no rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Garbage,
    Unrecognized,
}

/// Classifies a line that no grammar rule recognized.
pub fn classify_unmatched(line: &str) -> LineClass {
    if is_garbage(line) {
        LineClass::Garbage
    } else {
        LineClass::Unrecognized
    }
}

/// Returns `true` for blank lines and known device noise.
pub fn is_garbage(line: &str) -> bool {
    line.trim().is_empty() || PATTERNS.garbage.iter().any(|re| re.is_match(line))
}

/// Returns `true` when `line` starts with a device prompt.
pub fn is_prompt(line: &str) -> bool {
    PATTERNS.prompt.is_match(line)
}

/// A prompt line split into hostname and the command typed after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLine<'a> {
    pub hostname: &'a str,
    pub command: &'a str,
}

pub fn parse_prompt(line: &str) -> Option<PromptLine<'_>> {
    let caps = PATTERNS.prompt.captures(line)?;
    let hostname = caps
        .name("angle")
        .or_else(|| caps.name("square"))
        .or_else(|| caps.name("hash"))?
        .as_str();
    let command = caps.name("command").map_or("", |m| m.as_str().trim());
    Some(PromptLine { hostname, command })
}

/// Returns `true` when `typed` abbreviates `full` word by word, the way a
/// device CLI accepts `dis ip int br` for `display ip interface brief`.
///
/// `typed` may carry extra trailing words (arguments) beyond `full`.
pub fn command_abbreviates(typed: &str, full: &str) -> bool {
    let mut typed_words = typed.split_whitespace();
    for expected in full.split_whitespace() {
        let Some(word) = typed_words.next() else {
            return false;
        };
        if !expected.starts_with(&word.to_ascii_lowercase()) {
            return false;
        }
    }
    true
}

/// Returns the hostname when `line` is a prompt echoing `command`.
pub fn command_echo<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    let prompt = parse_prompt(line)?;
    command_abbreviates(prompt.command, command).then_some(prompt.hostname)
}

/// Truncates a line for storage in a diagnostic.
pub fn snippet(line: &str, max_chars: usize) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_noise_is_garbage() {
        for line in [
            "",
            "   ",
            "Error: Unrecognized command found at '^' position.",
            "Info: The max number of VTY users is 10.",
            "% Incomplete command found at '^' position.",
            "              ^",
            "2024-01-15 10:22:33+08:00",
            "Jan 15 2024 10:22:33+08:00",
            "-------------------------------------------------",
            "  ---- More ----",
        ] {
            assert!(is_garbage(line), "{line:?} should be garbage");
        }
    }

    #[test]
    fn test_content_is_unrecognized() {
        assert_eq!(
            classify_unmatched("10.0.0.1  bogus"),
            LineClass::Unrecognized
        );
        assert_eq!(classify_unmatched("Total: 3"), LineClass::Unrecognized);
    }

    #[test]
    fn test_prompt_shapes() {
        assert!(is_prompt("<R1>display arp"));
        assert!(is_prompt("<R1>"));
        assert!(is_prompt("[~R1-GigabitEthernet0/0/1]"));
        assert!(is_prompt("R1#show ip route"));
        assert!(!is_prompt("  10.0.0.1  4  65000"));
        assert!(!is_prompt("#"));
        assert!(!is_prompt("Peer  V  AS"));
    }

    #[test]
    fn test_parse_prompt_splits_hostname_and_command() {
        let prompt = parse_prompt("<CORE-R1>dis bgp peer").unwrap();
        assert_eq!(prompt.hostname, "CORE-R1");
        assert_eq!(prompt.command, "dis bgp peer");
    }

    #[test]
    fn test_command_abbreviation() {
        assert!(command_abbreviates("dis ip int br", "display ip interface brief"));
        assert!(command_abbreviates("display elabel slot 1", "display elabel"));
        assert!(!command_abbreviates("display elabel", "display elabel brief"));
        assert!(!command_abbreviates("dis arp", "display elabel"));
    }

    #[test]
    fn test_command_echo_returns_hostname() {
        assert_eq!(command_echo("<R1>dis elabel", "display elabel"), Some("R1"));
        assert_eq!(command_echo("<R1>dis arp", "display elabel"), None);
        assert_eq!(command_echo("display elabel", "display elabel"), None);
    }

    #[test]
    fn test_snippet_truncates_long_lines() {
        let long = "x".repeat(100);
        let short = snippet(&long, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.ends_with("..."));
        assert_eq!(snippet("  short  ", 20), "short");
    }
}
