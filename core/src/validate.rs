//! Document-level validation rules and bundle validation.
//!
//! Grammars register named [`ValidationRule`]s that run once over a finished
//! [`Document`]. A failing rule never rejects the document; it only appends
//! a diagnostic to `warnings` or `errors` depending on its [`Severity`].
//!
//! # Examples
//!
//! ```
//! use netlog_core::*;
//!
//! fn needs_router_id(doc: &Document) -> Result<(), String> {
//!     doc.get_str("router_id")
//!         .map(|_| ())
//!         .ok_or_else(|| "router ID missing".to_string())
//! }
//!
//! static RULES: &[ValidationRule] = &[ValidationRule::error("router_id_present", needs_router_id)];
//!
//! let mut doc = Document::new("bgp_peer");
//! run_validations(&mut doc, RULES);
//! assert_eq!(doc.errors.len(), 1);
//! assert_eq!(doc.errors[0].rule.as_deref(), Some("router_id_present"));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CaptureBundle, Diagnostic, DiagnosticKind, Document, Severity};

/// Check function for a validation rule.
pub type ValidationCheck = fn(&Document) -> Result<(), String>;

/// A named assertion over a finished document.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRule {
    pub name: &'static str,
    pub severity: Severity,
    pub check: ValidationCheck,
}

impl ValidationRule {
    pub const fn warning(name: &'static str, check: ValidationCheck) -> Self {
        Self {
            name,
            severity: Severity::Warning,
            check,
        }
    }

    pub const fn error(name: &'static str, check: ValidationCheck) -> Self {
        Self {
            name,
            severity: Severity::Error,
            check,
        }
    }
}

/// Runs every rule against `doc`, annotating it with one diagnostic per
/// failed rule. Returns the number of failures.
pub fn run_validations(doc: &mut Document, rules: &[ValidationRule]) -> usize {
    let mut failures = 0;
    for rule in rules {
        let Err(message) = (rule.check)(doc) else {
            continue;
        };
        failures += 1;
        let diagnostic =
            Diagnostic::new(DiagnosticKind::ValidationFailed, message).with_rule(rule.name);
        match rule.severity {
            Severity::Warning => doc.warn(diagnostic),
            Severity::Error => doc.error(diagnostic),
        }
    }
    failures
}

/// Compares a declared count field against the number of rows under
/// `rows_key`. Passes when the declared field is absent.
pub fn check_declared_count(doc: &Document, declared_key: &str, rows_key: &str) -> Result<(), String> {
    let Some(declared) = doc.get_i64(declared_key) else {
        return Ok(());
    };
    let actual = doc.rows(rows_key).len() as i64;
    if declared == actual {
        Ok(())
    } else {
        Err(format!(
            "{declared_key} declares {declared} but {actual} {rows_key} were parsed"
        ))
    }
}

/// Structural errors found in a [`CaptureBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Bundle version string is empty.
    #[error("bundle version cannot be empty")]
    EmptyBundleVersion,
    /// A source name is empty or whitespace-only.
    #[error("capture source cannot be empty")]
    EmptySource,
    /// Two captures in the same bundle share a source name.
    #[error("duplicate capture source in bundle: {0}")]
    DuplicateSource(String),
    /// A document carries no type tag.
    #[error("document without type tag in capture: {0}")]
    UntypedDocument(String),
}

/// Validates a capture bundle before it is handed to storage.
///
/// # Examples
///
/// ```
/// use netlog_core::*;
///
/// let mut bundle = CaptureBundle::new("1.0.0", "2024-01-15T10:30:00Z");
/// bundle.captures.push(Capture::new("r1.log", vec![Document::new("arp")]));
/// assert!(validate_bundle(&bundle).is_empty());
///
/// bundle.captures.push(Capture::new("r1.log", Vec::new()));
/// let errors = validate_bundle(&bundle);
/// assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateSource(_))));
/// ```
pub fn validate_bundle(bundle: &CaptureBundle) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if bundle.version.trim().is_empty() {
        errors.push(ValidationError::EmptyBundleVersion);
        return errors;
    }

    let mut seen_sources: HashSet<&str> = HashSet::new();
    for capture in &bundle.captures {
        let source = capture.source.trim();
        if source.is_empty() {
            errors.push(ValidationError::EmptySource);
            return errors;
        }
        if !seen_sources.insert(source) {
            errors.push(ValidationError::DuplicateSource(source.to_string()));
            return errors;
        }
        if capture.documents.iter().any(|doc| doc.kind.trim().is_empty()) {
            errors.push(ValidationError::UntypedDocument(source.to_string()));
            return errors;
        }
    }

    errors
}
