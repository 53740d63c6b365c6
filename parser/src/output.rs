//! Output formatting for documents, bundles and reports.

use serde::Serialize;
use serde_json::Value;

use netlog_core::{CaptureBundle, Document};

use crate::report::ScanReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => {
            Some(serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}")))
        }
        OutputFormat::Yaml => {
            Some(serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")))
        }
        OutputFormat::Markdown | OutputFormat::Table => None,
    }
}

/// Formats the documents of one pass in the requested output format.
pub fn format_documents(documents: &[Document], format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(documents, format) {
        return serialized;
    }
    match format {
        OutputFormat::Markdown => Ok(documents_to_markdown(documents)),
        _ => Ok(documents_to_table(documents)),
    }
}

/// Formats a capture bundle in the requested output format.
pub fn format_bundle(bundle: &CaptureBundle, format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(bundle, format) {
        return serialized;
    }
    let mut out = String::new();
    for capture in &bundle.captures {
        match format {
            OutputFormat::Markdown => {
                out.push_str(&format!("# {}\n\n", capture.source));
                out.push_str(&documents_to_markdown(&capture.documents));
            }
            _ => {
                out.push_str(&format!("== {} ==\n", capture.source));
                out.push_str(&documents_to_table(&capture.documents));
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Formats a scan report in the requested output format.
pub fn format_report(report: &ScanReport, format: OutputFormat) -> Result<String, String> {
    if let Some(serialized) = serialize(report, format) {
        return serialized;
    }
    match format {
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
        _ => Ok(report_to_table(report)),
    }
}

/// Renders a scalar field for the human-readable formats.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("-".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn documents_to_markdown(documents: &[Document]) -> String {
    let mut out = String::new();

    for doc in documents {
        out.push_str(&format!("## {}\n\n", doc.kind));

        let scalars: Vec<(&String, String)> = doc
            .fields
            .iter()
            .filter_map(|(key, value)| scalar(value).map(|text| (key, text)))
            .collect();
        if !scalars.is_empty() {
            out.push_str("| Field | Value |\n");
            out.push_str("|-------|-------|\n");
            for (key, text) in scalars {
                out.push_str(&format!("| `{key}` | {text} |\n"));
            }
            out.push('\n');
        }

        for (key, value) in &doc.fields {
            if let Value::Array(rows) = value {
                out.push_str(&format!("**{key}:** {} rows\n\n", rows.len()));
            }
        }

        if !doc.warnings.is_empty() || !doc.errors.is_empty() {
            out.push_str("### Diagnostics\n\n");
            for diagnostic in doc.errors.iter().chain(&doc.warnings) {
                let line = diagnostic.line.as_deref().unwrap_or("");
                out.push_str(&format!("- **{}**: {} `{line}`\n", diagnostic.kind, diagnostic.message));
            }
            out.push('\n');
        }
    }

    out
}

fn row_total(doc: &Document) -> usize {
    doc.fields
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .sum()
}

fn documents_to_table(documents: &[Document]) -> String {
    let mut out = String::new();
    let max_kind = documents
        .iter()
        .map(|doc| doc.kind.len())
        .max()
        .unwrap_or(4)
        .max(4);

    out.push_str(&format!(
        "{:<width$}  {:>6}  {:>5}  {:>8}  {:>6}\n",
        "TYPE",
        "FIELDS",
        "ROWS",
        "WARNINGS",
        "ERRORS",
        width = max_kind
    ));
    for doc in documents {
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:>5}  {:>8}  {:>6}\n",
            doc.kind,
            doc.fields.len(),
            row_total(doc),
            doc.warnings.len(),
            doc.errors.len(),
            width = max_kind
        ));
    }
    out
}

fn report_to_markdown(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Scan report: {}\n\n", report.source));
    out.push_str(&format!("**Status:** {}\n\n", report.status));
    out.push_str(&format!(
        "**Coverage:** {:.0}% ({} of {} lines, {} dead)\n\n",
        report.coverage * 100.0,
        report.lines_in_blocks,
        report.lines,
        report.dead_lines
    ));
    out.push_str(&format!(
        "**Diagnostics:** {} warnings, {} errors\n\n",
        report.warnings, report.errors
    ));

    if !report.documents.is_empty() {
        out.push_str("| Type | Documents |\n");
        out.push_str("|------|-----------|\n");
        for (kind, count) in &report.documents {
            out.push_str(&format!("| `{kind}` | {count} |\n"));
        }
        out.push('\n');
    }

    if !report.failed_documents.is_empty() {
        out.push_str("## Documents with errors\n\n");
        for name in &report.failed_documents {
            out.push_str(&format!("- `{name}`\n"));
        }
        out.push('\n');
    }

    out
}

fn report_to_table(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Source: {}  Status: {}  Coverage: {:.0}%\n",
        report.source,
        report.status,
        report.coverage * 100.0
    ));
    out.push_str(&format!(
        "  lines={} in_blocks={} dead={} blocks={} warnings={} errors={}\n",
        report.lines,
        report.lines_in_blocks,
        report.dead_lines,
        report.blocks,
        report.warnings,
        report.errors
    ));
    for (kind, count) in &report.documents {
        out.push_str(&format!("  {kind:<24} {count}\n"));
    }
    out
}
