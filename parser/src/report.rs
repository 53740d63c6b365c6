//! Structured reporting for one scanning pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use netlog_core::Document;

use crate::diagnostics::BlockMetrics;
use crate::scanner::ScanStats;

/// Overall outcome of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// Every document parsed without warnings or errors.
    Clean,
    /// At least one document carries a warning or an error.
    Degraded,
    /// No block was recognized.
    Empty,
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Degraded => write!(f, "degraded"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Summary of one scanning pass over one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// File path, or `-` for standard input.
    pub source: String,
    pub status: PassStatus,
    pub lines: usize,
    pub lines_in_blocks: usize,
    pub dead_lines: usize,
    pub blocks: usize,
    /// Share of lines inside a block (0.0 - 1.0).
    pub coverage: f64,
    /// Document count per type tag, sorted by tag.
    pub documents: BTreeMap<String, usize>,
    pub warnings: usize,
    pub errors: usize,
    /// Documents carrying at least one error, as `type` at stream index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_documents: Vec<String>,
    /// Per-block timings, when a metrics collector was attached.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_metrics: Vec<BlockMetrics>,
}

impl ScanReport {
    /// Builds the report for a finished pass.
    pub fn from_pass(
        source: impl Into<String>,
        documents: &[Document],
        stats: ScanStats,
        block_metrics: Vec<BlockMetrics>,
    ) -> Self {
        let mut by_type = BTreeMap::new();
        let mut warnings = 0;
        let mut errors = 0;
        let mut failed_documents = Vec::new();
        for (index, doc) in documents.iter().enumerate() {
            *by_type.entry(doc.kind.clone()).or_insert(0) += 1;
            warnings += doc.warnings.len();
            errors += doc.errors.len();
            if !doc.errors.is_empty() {
                failed_documents.push(format!("{}@{index}", doc.kind));
            }
        }

        let status = if documents.is_empty() {
            PassStatus::Empty
        } else if warnings + errors == 0 {
            PassStatus::Clean
        } else {
            PassStatus::Degraded
        };

        Self {
            source: source.into(),
            status,
            lines: stats.lines,
            lines_in_blocks: stats.lines_in_blocks,
            dead_lines: stats.dead_lines,
            blocks: stats.blocks,
            coverage: stats.coverage(),
            documents: by_type,
            warnings,
            errors,
            failed_documents,
            block_metrics,
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.values().sum()
    }
}
