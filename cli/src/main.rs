use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use netlog_core::{Capture, CaptureBundle, Document};
use netlog_parser::batch::{BatchOptions, parse_files};
use netlog_parser::output::{OutputFormat, format_bundle, format_documents, format_report};
use netlog_parser::scanner::{scan_owned, scan_reader};
use netlog_parser::{
    Candidate, Diagnostics, MetricsCollector, ParserRegistry, RegistryStats, ScanConfig, ScanReport,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "netlog")]
#[command(about = "Parse router and switch CLI session logs into structured documents")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one or more session log files.
    Parse(ParseArgs),
    /// Parse a session log from stdin.
    ParseStdin(ParseStdinArgs),
    /// Rank parsers against the leading lines of a log.
    Rank(RankArgs),
    /// List the loaded parsers.
    Parsers(ParsersArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// YAML scan configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated parser names to leave out (added to the config).
    #[arg(long)]
    disable: Option<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Session log files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    scan: ScanArgs,
    /// Number of parallel file jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output scan reports alongside the documents.
    #[arg(long)]
    with_report: bool,
    /// Let the best-ranked parser own each whole file.
    #[arg(long)]
    owner: bool,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    #[command(flatten)]
    scan: ScanArgs,
    /// Output the scan report alongside the documents.
    #[arg(long)]
    with_report: bool,
    /// Let the best-ranked parser own the whole input.
    #[arg(long)]
    owner: bool,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct RankArgs {
    /// Session log file.
    input: PathBuf,
    #[command(flatten)]
    scan: ScanArgs,
    /// Leading lines to sample (default: from config).
    #[arg(long)]
    sample: Option<usize>,
    /// Output format.
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParsersArgs {
    #[command(flatten)]
    scan: ScanArgs,
    /// Output format.
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::ParseStdin(args) => run_parse_stdin(args),
        Command::Rank(args) => run_rank(args),
        Command::Parsers(args) => run_parsers(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ScanArgs) -> Result<ScanConfig, String> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ScanConfig::default(),
    };
    config
        .disabled_parsers
        .extend(parse_csv_list(args.disable.as_deref()));
    Ok(config)
}

fn parse_csv_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn new_bundle() -> CaptureBundle {
    CaptureBundle::new(PACKAGE_VERSION, chrono::Utc::now().to_rfc3339())
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    bundle: &'a CaptureBundle,
    reports: &'a [ScanReport],
}

fn print_bundle(bundle: &CaptureBundle, reports: Option<&[ScanReport]>, format: OutputFormat) -> Result<(), String> {
    let Some(reports) = reports else {
        println!("{}", format_bundle(bundle, format)?);
        return Ok(());
    };

    let output = ParseOutput { bundle, reports };
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&output)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{yaml}");
        }
        _ => {
            print!("{}", format_bundle(bundle, format)?);
            for report in reports {
                print!("{}", format_report(report, format)?);
            }
        }
    }
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let config = load_config(&args.scan)?;
    let registry = ParserRegistry::load(Diagnostics::noop(), &config);
    let options = BatchOptions {
        jobs: args.jobs,
        owner: args.owner,
        collect_metrics: args.with_report,
    };

    tracing::debug!(inputs = args.inputs.len(), parsers = registry.len(), "parsing inputs");

    let mut bundle = new_bundle();
    let mut reports = Vec::new();
    let mut failures = 0;
    for result in parse_files(&registry, &args.inputs, &options) {
        match result {
            Ok(file) => {
                bundle.captures.push(Capture::new(file.source, file.documents));
                reports.push(file.report);
            }
            Err(err) => {
                eprintln!("error: {err}");
                failures += 1;
            }
        }
    }

    print_bundle(&bundle, args.with_report.then_some(&reports[..]), args.format)?;

    if failures > 0 {
        return Err(format!("{failures} of {} inputs failed", args.inputs.len()));
    }
    Ok(())
}

fn run_parse_stdin(args: ParseStdinArgs) -> Result<(), String> {
    let config = load_config(&args.scan)?;
    let collector = std::sync::Arc::new(MetricsCollector::new());
    let diagnostics = if args.with_report {
        Diagnostics::with_recorder(collector.clone())
    } else {
        Diagnostics::noop()
    };
    let mut registry = ParserRegistry::load(diagnostics, &config);

    let (documents, stats) = if args.owner {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("Failed to read stdin: {err}"))?;
        let lines: Vec<&str> = text.lines().collect();
        scan_owned(&mut registry, &lines)
    } else {
        scan_reader(&mut registry, std::io::stdin().lock())
            .map_err(|err| format!("Failed to read stdin: {err}"))?
    };

    if args.with_report {
        let report = ScanReport::from_pass("-", &documents, stats, collector.snapshot());
        let mut bundle = new_bundle();
        bundle.captures.push(Capture::new("-", documents));
        return print_bundle(&bundle, Some(std::slice::from_ref(&report)), args.format);
    }

    print_documents(&documents, args.format)
}

fn print_documents(documents: &[Document], format: OutputFormat) -> Result<(), String> {
    println!("{}", format_documents(documents, format)?);
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<(), String> {
    let config = load_config(&args.scan)?;
    let registry = ParserRegistry::load(Diagnostics::noop(), &config);
    let text = fs::read(&args.input)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;

    let sample_len = args
        .sample
        .filter(|sample| *sample > 0)
        .unwrap_or(config.scanner.header_sample_lines);
    let sample: Vec<&str> = text.lines().take(sample_len).collect();
    let candidates = registry.rank(&sample);

    match format_serialized(&candidates, args.format)? {
        Some(out) => println!("{out}"),
        None => print!("{}", candidates_to_table(&candidates)),
    }
    Ok(())
}

fn run_parsers(args: ParsersArgs) -> Result<(), String> {
    let config = load_config(&args.scan)?;
    let registry = ParserRegistry::load(Diagnostics::noop(), &config);
    let stats = registry.stats();

    match format_serialized(&stats, args.format)? {
        Some(out) => println!("{out}"),
        None => print!("{}", stats_to_table(&stats)),
    }
    Ok(())
}

fn format_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(Some)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(Some)
            .map_err(|e| format!("YAML serialization failed: {e}")),
        OutputFormat::Markdown | OutputFormat::Table => Ok(None),
    }
}

fn candidates_to_table(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No parser matches the sampled lines.\n".to_string();
    }
    let mut out = format!("{:<24} {:>10} {:>8} {:>8}\n", "PARSER", "CONFIDENCE", "MATCHED", "PRIORITY");
    for candidate in candidates {
        out.push_str(&format!(
            "{:<24} {:>9.0}% {:>4}/{:<3} {:>8}\n",
            candidate.name,
            candidate.confidence * 100.0,
            candidate.matched,
            candidate.sampled,
            candidate.priority
        ));
    }
    out
}

fn stats_to_table(stats: &RegistryStats) -> String {
    let mut out = format!(
        "Loaded: {}  With validations: {}\n",
        stats.loaded, stats.with_validations
    );
    if !stats.failed.is_empty() {
        out.push_str(&format!("Failed: {}\n", stats.failed.join(", ")));
    }
    if !stats.disabled.is_empty() {
        out.push_str(&format!("Disabled: {}\n", stats.disabled.join(", ")));
    }
    out.push('\n');
    out.push_str(&format!("{:<24} {:>8} {:>6}  {}\n", "PARSER", "PRIORITY", "RULES", "VALIDATES"));
    for info in &stats.parsers {
        let validates = if info.has_validations { "yes" } else { "no" };
        out.push_str(&format!(
            "{:<24} {:>8} {:>6}  {validates}\n",
            info.name, info.priority, info.rules
        ));
    }
    out
}
