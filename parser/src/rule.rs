//! Ordered rule matching.
//!
//! A [`Rule`] pairs a named regex with a handler. A [`RuleSet`] tries its
//! rules in declared order and runs the handler of the first pattern that
//! matches; later rules are never consulted for that line, so grammars list
//! specific row shapes before generic fallbacks.
//!
//! Handlers are plain functions that receive the grammar's cursor state
//! explicitly, never closures over outer mutable state.

use regex::{Captures, Regex};
use serde_json::Value;

use netlog_core::{Row, coerce, coerce_opt};

use crate::block::Block;
use crate::error::RuleError;

/// Handler run when a rule's pattern matches.
pub type Handler<C> = fn(&mut C, &mut Block, &Fields<'_>) -> Result<(), RuleError>;

/// Named captures of one matched line.
pub struct Fields<'h> {
    regex: &'h Regex,
    caps: Captures<'h>,
    line: &'h str,
}

impl<'h> Fields<'h> {
    pub fn capture(regex: &'h Regex, line: &'h str) -> Option<Self> {
        let caps = regex.captures(line)?;
        Some(Self { regex, caps, line })
    }

    /// Returns the trimmed text of a named capture that participated in the
    /// match and is not empty.
    pub fn get(&self, name: &str) -> Option<&'h str> {
        self.caps
            .name(name)
            .map(|m| m.as_str().trim())
            .filter(|text| !text.is_empty())
    }

    pub fn require(&self, name: &'static str) -> Result<&'h str, RuleError> {
        self.get(name).ok_or(RuleError::MissingField(name))
    }

    /// Returns the coerced value of a capture, `null` when absent.
    pub fn value(&self, name: &str) -> Value {
        coerce_opt(self.get(name))
    }

    /// Parses a capture as an integer, failing the handler when it does not
    /// round-trip.
    pub fn int(&self, name: &'static str) -> Result<i64, RuleError> {
        let raw = self.require(name)?;
        netlog_core::coerce_int(raw).ok_or_else(|| RuleError::InvalidValue {
            field: name,
            value: raw.to_string(),
        })
    }

    /// Builds a row from every named capture, in pattern order.
    pub fn row(&self) -> Row {
        let mut row = Row::new();
        for name in self.regex.capture_names().flatten() {
            row.insert(name.to_string(), coerce_opt(self.get(name)));
        }
        row
    }

    /// Builds a row from the listed captures only.
    pub fn row_of(&self, names: &[&str]) -> Row {
        names
            .iter()
            .map(|name| (name.to_string(), self.value(name)))
            .collect()
    }

    /// Byte offset in the line where a named capture starts.
    pub fn start(&self, name: &str) -> Option<usize> {
        self.caps.name(name).map(|m| m.start())
    }

    pub fn line(&self) -> &'h str {
        self.line
    }
}

/// A named pattern and its handler.
pub struct Rule<C> {
    pub name: &'static str,
    pattern: Regex,
    handler: Handler<C>,
}

impl<C> Rule<C> {
    pub fn new(name: &'static str, pattern: &str, handler: Handler<C>) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            handler,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Result of offering one line to a rule set.
#[derive(Debug, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched(&'static str),
    Failed { rule: &'static str, error: RuleError },
    NoMatch,
}

/// Rules evaluated in declared order, first match wins.
pub struct RuleSet<C> {
    rules: Vec<Rule<C>>,
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C> RuleSet<C> {
    pub fn new(rules: Vec<Rule<C>>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, cursor: &mut C, block: &mut Block, line: &str) -> RuleOutcome {
        for rule in &self.rules {
            let Some(fields) = Fields::capture(&rule.pattern, line) else {
                continue;
            };
            return match (rule.handler)(cursor, block, &fields) {
                Ok(()) => RuleOutcome::Matched(rule.name),
                Err(error) => RuleOutcome::Failed {
                    rule: rule.name,
                    error,
                },
            };
        }
        RuleOutcome::NoMatch
    }

    /// Returns the name of the rule that would handle `line`.
    pub fn first_match(&self, line: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.is_match(line))
            .map(|rule| rule.name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Returns the coerced value of `raw` after trimming, `null` when empty.
pub fn trimmed_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        coerce(trimmed)
    }
}
