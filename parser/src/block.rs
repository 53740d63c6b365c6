//! Per-block accumulator and entry-point matches.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Diagnostic, DiagnosticKind, Document, Row};

use crate::classify::snippet;
use crate::error::RuleError;
use crate::rule::trimmed_value;

/// Captures taken from the line that opened a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMatch {
    fields: Vec<(String, String)>,
}

impl EntryMatch {
    /// An entry match carrying no captures.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Matches `regex` against `line`, keeping every named capture that
    /// participated.
    pub fn capture(regex: &Regex, line: &str) -> Option<Self> {
        let caps = regex.captures(line)?;
        let fields = regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().trim().to_string()))
            })
            .collect();
        Some(Self { fields })
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// The document being built for the active block plus line accounting.
#[derive(Debug)]
pub struct Block {
    doc: Document,
    entry_line: String,
    lines: usize,
    garbage_lines: usize,
    snippet_len: usize,
}

impl Block {
    pub fn new(kind: &str, entry_line: &str, snippet_len: usize) -> Self {
        Self {
            doc: Document::new(kind),
            entry_line: entry_line.to_string(),
            lines: 0,
            garbage_lines: 0,
            snippet_len,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn entry_line(&self) -> &str {
        &self.entry_line
    }

    /// Top-level fields of the document being built.
    pub fn fields_mut(&mut self) -> &mut Row {
        &mut self.doc.fields
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.doc.set(key, value);
    }

    /// Stores a raw text field, trimmed and coerced.
    pub fn set_text(&mut self, key: &str, raw: &str) {
        self.doc.set(key, trimmed_value(raw));
    }

    pub fn push_row(&mut self, key: &str, row: Row) {
        self.doc.push_row(key, row);
    }

    pub fn last_row_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.doc.last_row_mut(key)
    }

    pub fn row_count(&self, key: &str) -> usize {
        self.doc.rows(key).len()
    }

    /// Returns the row at `index` under `key`.
    pub fn row_mut(&mut self, key: &str, index: usize) -> Option<&mut Row> {
        self.doc
            .get_mut(key)
            .and_then(Value::as_array_mut)
            .and_then(|rows| rows.get_mut(index))
            .and_then(Value::as_object_mut)
    }

    /// Returns the row a cursor reference points at, if any.
    pub fn record_mut(&mut self, key: &str, index: Option<usize>) -> Option<&mut Row> {
        self.row_mut(key, index?)
    }

    pub fn warn_unrecognized(&mut self, line: &str) {
        let diagnostic = Diagnostic::new(DiagnosticKind::UnrecognizedLine, "line matched no rule")
            .with_line(snippet(line, self.snippet_len));
        self.doc.warn(diagnostic);
    }

    /// Records a continuation line that had no record to attach to.
    pub fn warn_orphan(&mut self, line: &str, message: &str) {
        let diagnostic = Diagnostic::new(DiagnosticKind::OrphanContinuation, message)
            .with_line(snippet(line, self.snippet_len));
        self.doc.warn(diagnostic);
    }

    pub fn handler_failed(&mut self, rule: &str, error: &RuleError, line: &str) {
        let diagnostic = Diagnostic::new(DiagnosticKind::HandlerFailed, error.to_string())
            .with_rule(rule)
            .with_line(snippet(line, self.snippet_len));
        self.doc.error(diagnostic);
    }

    pub(crate) fn note_line(&mut self) {
        self.lines += 1;
    }

    pub(crate) fn note_garbage(&mut self) {
        self.garbage_lines += 1;
    }

    /// Lines consumed so far, entry line included.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn garbage_lines(&self) -> usize {
        self.garbage_lines
    }

    pub(crate) fn into_document(self) -> Document {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_match_keeps_participating_captures() {
        let re = Regex::new(r"^(?P<trunk>Eth-Trunk\d+)'s state(?P<extra> information)?").unwrap();
        let entry = EntryMatch::capture(&re, "Eth-Trunk1's state is:").unwrap();
        assert_eq!(entry.get("trunk"), Some("Eth-Trunk1"));
        assert_eq!(entry.get("extra"), None);
        assert!(EntryMatch::capture(&re, "nothing").is_none());
    }

    #[test]
    fn test_warnings_carry_truncated_snippets() {
        let mut block = Block::new("arp", "IP ADDRESS", 10);
        block.warn_unrecognized("0123456789abcdef");
        let warning = &block.doc().warnings[0];
        assert_eq!(warning.kind, DiagnosticKind::UnrecognizedLine);
        assert_eq!(warning.line.as_deref(), Some("0123456..."));
    }

    #[test]
    fn test_handler_failure_is_an_error() {
        let mut block = Block::new("arp", "", 80);
        block.handler_failed("entry", &RuleError::MissingField("ip"), "bad row");
        assert_eq!(block.doc().errors.len(), 1);
        assert_eq!(block.doc().errors[0].rule.as_deref(), Some("entry"));
        assert!(block.doc().warnings.is_empty());
    }

    #[test]
    fn test_set_text_coerces() {
        let mut block = Block::new("x", "", 80);
        block.set_text("mtu", " 1500 ");
        block.set_text("descr", "  ");
        assert_eq!(block.doc().get_i64("mtu"), Some(1500));
        assert_eq!(block.doc().get("descr"), Some(&Value::Null));
    }
}
