//! Document type definitions for parsed command output.
//!
//! A [`Document`] is the structured result of one parsed block: a `type`
//! tag naming the grammar that produced it, a flat map of grammar-specific
//! fields (scalars, nested objects or arrays of row records), and the
//! diagnostics collected while the block was parsed. The types serialize
//! with [`serde`] so they can be handed to any storage backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version of the document contract (semver).
///
/// Embedded in every [`CaptureBundle`](crate::CaptureBundle) so storage
/// collaborators can track compatibility.
pub const DOCUMENT_CONTRACT_VERSION: &str = "1.0.0";

/// A row record inside a tabular document field.
pub type Row = Map<String, Value>;

/// Severity of a diagnostic attached to a document.
///
/// # Examples
///
/// ```
/// use netlog_core::Severity;
///
/// assert_eq!(Severity::default(), Severity::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

/// What kind of degradation a diagnostic describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A line inside the block matched no rule and is not device noise.
    UnrecognizedLine,
    /// A rule matched but its handler rejected the captured fields.
    HandlerFailed,
    /// A continuation line arrived with no record to attach to.
    OrphanContinuation,
    /// A document-level assertion failed after the block was complete.
    ValidationFailed,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedLine => write!(f, "unrecognized_line"),
            Self::HandlerFailed => write!(f, "handler_failed"),
            Self::OrphanContinuation => write!(f, "orphan_continuation"),
            Self::ValidationFailed => write!(f, "validation_failed"),
        }
    }
}

/// One warning or error recorded while parsing a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Rule or validation name that produced the diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Truncated copy of the offending line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            rule: None,
            line: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }
}

/// Structured result of one parsed block.
///
/// Grammar-specific fields are flattened next to the `type` tag when
/// serialized, so a document reads as a single JSON object.
///
/// # Examples
///
/// ```
/// use netlog_core::Document;
///
/// let mut doc = Document::new("arp");
/// doc.set("total", 3);
/// assert_eq!(doc.kind, "arp");
/// assert_eq!(doc.get_i64("total"), Some(3));
///
/// let json = serde_json::to_value(&doc).unwrap();
/// assert_eq!(json["type"], "arp");
/// assert_eq!(json["total"], 3);
/// assert!(json["warnings"].as_array().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub warnings: Vec<Diagnostic>,
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
}

impl Document {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Returns the rows stored under `key`, or an empty slice when the
    /// field is missing or not an array.
    pub fn rows(&self, key: &str) -> &[Value] {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Appends a row to the array stored under `key`, creating the array
    /// on first use.
    pub fn push_row(&mut self, key: &str, row: Row) {
        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(Value::Object(row));
        }
    }

    /// Returns the last row stored under `key`.
    pub fn last_row_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.fields
            .get_mut(key)
            .and_then(Value::as_array_mut)
            .and_then(|items| items.last_mut())
            .and_then(Value::as_object_mut)
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }

    pub fn error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    /// Returns `true` when the block parsed without any diagnostics.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_flat_with_type_tag() {
        let mut doc = Document::new("bgp_peer");
        doc.set("router_id", "1.1.1.1");
        let mut row = Row::new();
        row.insert("peer".into(), Value::from("10.0.0.1"));
        doc.push_row("peers", row);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "bgp_peer");
        assert_eq!(json["router_id"], "1.1.1.1");
        assert_eq!(json["peers"][0]["peer"], "10.0.0.1");
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn test_document_deserializes_back() {
        let raw = r#"{"type":"arp","total":2,"warnings":[],"errors":[]}"#;
        let doc: Document = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.kind, "arp");
        assert_eq!(doc.get_i64("total"), Some(2));
        assert!(doc.is_clean());
    }

    #[test]
    fn test_last_row_mut_targets_latest_row() {
        let mut doc = Document::new("arp");
        doc.push_row("entries", Row::new());
        doc.push_row("entries", Row::new());
        doc.last_row_mut("entries")
            .unwrap()
            .insert("vlan".into(), Value::from(10));

        assert_eq!(doc.rows("entries").len(), 2);
        assert_eq!(doc.rows("entries")[1]["vlan"], 10);
        assert!(doc.rows("entries")[0].get("vlan").is_none());
    }

    #[test]
    fn test_rows_of_missing_field_is_empty() {
        let doc = Document::new("arp");
        assert!(doc.rows("entries").is_empty());
        assert!(Document::new("x").last_row_mut("entries").is_none());
    }

    #[test]
    fn test_diagnostic_kind_display_matches_serde() {
        for kind in [
            DiagnosticKind::UnrecognizedLine,
            DiagnosticKind::HandlerFailed,
            DiagnosticKind::OrphanContinuation,
            DiagnosticKind::ValidationFailed,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
