//! Core document types for parsed network-device command output.
//!
//! This crate defines the data model shared by the block parsing engine and
//! its storage collaborators:
//!
//! - [`Document`]: the tagged, structured result of one parsed block.
//! - [`Diagnostic`]: a warning or error recorded while parsing a block.
//! - [`coerce`]: the "round-trip or stay string" rule for captured fields.
//! - [`ValidationRule`]: named assertions run over a finished document.
//! - [`CaptureBundle`]: documents from several sources, ready for storage.
//!
//! # Example
//!
//! ```
//! use netlog_core::*;
//!
//! let mut doc = Document::new("arp");
//! doc.set("total", coerce("1"));
//! let mut row = Row::new();
//! row.insert("ip".into(), coerce("10.0.0.1"));
//! doc.push_row("entries", row);
//!
//! fn total_matches(doc: &Document) -> Result<(), String> {
//!     check_declared_count(doc, "total", "entries")
//! }
//!
//! static RULES: &[ValidationRule] = &[ValidationRule::warning("total_matches", total_matches)];
//! run_validations(&mut doc, RULES);
//! assert!(doc.is_clean());
//! ```

mod coerce;
mod package;
mod types;
mod validate;

pub use coerce::{coerce, coerce_int, coerce_opt};
pub use package::{Capture, CaptureBundle};
pub use types::*;
pub use validate::{
    ValidationCheck, ValidationError, ValidationRule, check_declared_count, run_validations,
    validate_bundle,
};
