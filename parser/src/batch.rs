//! Parsing several capture files at once.
//!
//! Each file gets its own registry, built inside the worker from the
//! caller's registration list and configuration, so no parser state is
//! shared between passes. Results come back in input order.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use netlog_core::Document;

use crate::config::ScanConfig;
use crate::diagnostics::{Diagnostics, MetricsCollector};
use crate::error::ScanError;
use crate::registry::{ParserFactory, ParserRegistry};
use crate::report::ScanReport;
use crate::scanner::{ScanStats, scan_owned, scan_reader};

/// Options for [`parse_files`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` picks a count from the CPUs and file count.
    pub jobs: Option<usize>,
    /// Let the best-ranked parser own each file.
    pub owner: bool,
    /// Attach a metrics collector to every pass and keep its timings in
    /// the report.
    pub collect_metrics: bool,
}

/// Parsed documents and pass report for one file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub source: String,
    pub documents: Vec<Document>,
    pub report: ScanReport,
}

/// Scans one file with `registry`.
///
/// # Errors
///
/// Returns [`ScanError::File`] when the file cannot be opened or read.
pub fn parse_file(
    registry: &mut ParserRegistry,
    path: &Path,
    owner: bool,
) -> Result<(Vec<Document>, ScanStats), ScanError> {
    let file_error = |source| ScanError::File {
        path: path.display().to_string(),
        source,
    };

    if owner {
        let bytes = std::fs::read(path).map_err(file_error)?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        return Ok(scan_owned(registry, &lines));
    }

    let file = File::open(path).map_err(file_error)?;
    scan_reader(registry, BufReader::new(file)).map_err(|err| match err {
        ScanError::Io(source) => file_error(source),
        other => other,
    })
}

fn parse_one(
    factories: &[ParserFactory],
    config: &ScanConfig,
    diagnostics: &Diagnostics,
    path: &Path,
    options: &BatchOptions,
) -> Result<FileResult, ScanError> {
    let collector = options.collect_metrics.then(|| Arc::new(MetricsCollector::new()));
    let diagnostics = match &collector {
        Some(collector) => Diagnostics::with_recorder(collector.clone()),
        None => diagnostics.clone(),
    };
    let mut registry = ParserRegistry::with_factories(factories, diagnostics, config);

    let source = path.display().to_string();
    let (documents, stats) = parse_file(&mut registry, path, options.owner)?;
    let metrics = collector.map(|collector| collector.snapshot()).unwrap_or_default();
    let report = ScanReport::from_pass(source.clone(), &documents, stats, metrics);
    tracing::info!(
        source = %source,
        documents = documents.len(),
        coverage = report.coverage,
        "file parsed"
    );

    Ok(FileResult {
        source,
        documents,
        report,
    })
}

/// Parses every file in `paths`, in parallel, with independent copies of
/// `registry`. One file failing does not stop the others.
pub fn parse_files(
    registry: &ParserRegistry,
    paths: &[PathBuf],
    options: &BatchOptions,
) -> Vec<Result<FileResult, ScanError>> {
    let factories = registry.factories().to_vec();
    let config = registry.config().clone();
    let diagnostics = registry.diagnostics().clone();

    let jobs = options
        .jobs
        .or(config.jobs)
        .filter(|jobs| *jobs > 0)
        .unwrap_or_else(|| default_parallel_jobs(paths.len()));

    if jobs <= 1 || paths.len() <= 1 {
        return paths
            .iter()
            .map(|path| parse_one(&factories, &config, &diagnostics, path, options))
            .collect();
    }

    use rayon::prelude::*;
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| {
            paths
                .par_iter()
                .map(|path| parse_one(&factories, &config, &diagnostics, path, options))
                .collect()
        }),
        Err(err) => {
            tracing::warn!(error = %err, "thread pool unavailable; parsing sequentially");
            paths
                .iter()
                .map(|path| parse_one(&factories, &config, &diagnostics, path, options))
                .collect()
        }
    }
}

/// Chooses a worker count from available CPUs and the number of files.
pub fn default_parallel_jobs(file_count: usize) -> usize {
    let cpu_count = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(4);
    let adaptive_cap = if file_count >= 500 { 8 } else { 12 };
    cpu_count.min(adaptive_cap).max(1).min(file_count.max(1))
}
