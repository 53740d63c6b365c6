//! Stateful block parsing for network-device CLI session logs.
//!
//! This crate turns a captured router or switch session (a stream of
//! prompts, commands and their output) into structured [`Document`]s, one
//! per recognized command-output block. Each supported command has a
//! grammar: a small state machine that recognizes where its output starts,
//! interprets the following lines (tables, key-value sections, wrapped
//! continuation lines, nested configuration) and decides where it ends.
//!
//! Parsing degrades gracefully. A line no rule understands becomes a
//! warning on its document, a rule that cannot use its captures becomes an
//! error, and document-level assertions (declared totals against parsed
//! rows, for example) are reported as annotations. Only I/O failures stop a
//! pass.
//!
//! # Main entry points
//!
//! - [`parse_text`]: parse captured text with every built-in grammar.
//! - [`parse_text_with_report`]: same, plus a [`ScanReport`] with line
//!   coverage and diagnostic counts.
//! - [`rank_text`]: score every grammar against the leading lines of a
//!   capture.
//! - [`ParserRegistry`] and [`BlockScanner`]: the lower-level pieces for
//!   streaming input, custom registration lists or owner mode.
//! - [`batch::parse_files`]: parse many files in parallel.
//!
//! # Example
//!
//! ```
//! use netlog_parser::parse_text;
//!
//! let log = "\
//! <R1>display arp
//! IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE
//! ------------------------------------------------------------------------------
//! 10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1
//! ------------------------------------------------------------------------------
//! Total:1         Dynamic:1       Static:0     Interface:0
//! <R1>
//! ";
//!
//! let docs = parse_text(log);
//! assert_eq!(docs.len(), 1);
//! assert_eq!(docs[0].kind, "arp");
//! assert_eq!(docs[0].rows("entries")[0]["ip"], "10.0.0.1");
//! assert!(docs[0].is_clean());
//! ```
//!
//! # Writing a grammar
//!
//! Grammars implement [`Grammar`]: an entry-point test, an ordered
//! [`RuleSet`] of named patterns with handlers, a per-block cursor type and
//! optional hooks. [`GrammarParser`] wraps a grammar and supplies the shared
//! block lifecycle, and [`ParserFactory::of`] turns it into a registration
//! entry.
//!
//! [`Document`]: netlog_core::Document

pub mod batch;
pub mod block;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod grammars;
pub mod normalize;
pub mod output;
pub mod registry;
pub mod report;
pub mod rule;
pub mod scanner;

pub use block::{Block, EntryMatch};
pub use config::{ScanConfig, ScannerOptions};
pub use diagnostics::{BlockMetrics, Diagnostics, MetricsCollector, MetricsRecorder};
pub use error::{ConfigError, RegistryError, RuleError, ScanError};
pub use grammar::{BlockParser, Grammar, GrammarParser, Seed};
pub use registry::{Candidate, ParserFactory, ParserRegistry, RegistryStats};
pub use report::{PassStatus, ScanReport};
pub use rule::{Fields, Rule, RuleSet};
pub use scanner::{BlockScanner, ScanStats};

use std::sync::Arc;

use netlog_core::Document;

/// Parses captured session text with every built-in grammar.
///
/// Lines are normalized (carriage returns, ANSI escapes and pager prompts
/// removed) before scanning. Documents come back in stream order.
///
/// # Examples
///
/// ```
/// use netlog_parser::parse_text;
///
/// let docs = parse_text("<R1>display clock\n2023-01-01 10:00:00+08:00\nSunday\n<R1>");
/// for doc in &docs {
///     println!("{} ({} warnings)", doc.kind, doc.warnings.len());
/// }
/// ```
pub fn parse_text(text: &str) -> Vec<Document> {
    let mut registry = ParserRegistry::builtin();
    scanner::scan_lines(&mut registry, text.lines())
}

/// Parses captured session text and summarizes the pass.
///
/// Like [`parse_text`], but block timings are collected and a
/// [`ScanReport`] describes line coverage, document counts and diagnostics.
///
/// # Examples
///
/// ```
/// use netlog_parser::{PassStatus, parse_text_with_report};
///
/// let (docs, report) = parse_text_with_report("-", "banner\n<R1>display esn\nESN of slot 0: 2102351931P0C3000154\n");
/// assert_eq!(docs.len(), 1);
/// assert_eq!(report.status, PassStatus::Clean);
/// assert_eq!(report.dead_lines, 2);
/// ```
pub fn parse_text_with_report(source: &str, text: &str) -> (Vec<Document>, ScanReport) {
    let collector = Arc::new(MetricsCollector::new());
    let mut registry = ParserRegistry::load(
        Diagnostics::with_recorder(collector.clone()),
        &ScanConfig::default(),
    );
    let (documents, stats) = scanner::scan_lines_with_stats(&mut registry, text.lines());
    let report = ScanReport::from_pass(source, &documents, stats, collector.snapshot());
    (documents, report)
}

/// Ranks every built-in grammar against the first
/// [`DEFAULT_HEADER_SAMPLE_LINES`](config::DEFAULT_HEADER_SAMPLE_LINES)
/// lines of `text`.
///
/// # Examples
///
/// ```
/// use netlog_parser::rank_text;
///
/// let ranked = rank_text("Total Number of Routes: 1\nnoise\n");
/// assert!(ranked.is_empty() || ranked[0].confidence <= 1.0);
/// ```
pub fn rank_text(text: &str) -> Vec<Candidate> {
    let registry = ParserRegistry::builtin();
    let sample: Vec<&str> = text
        .lines()
        .take(registry.options().header_sample_lines)
        .collect();
    registry.rank(&sample)
}
