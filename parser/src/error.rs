//! Error types for the parsing engine.
//!
//! Per-line and per-block problems never surface here: they are recorded as
//! diagnostics on the document. These types cover the hard failures that
//! propagate to the caller.

use thiserror::Error;

/// Failure raised by a rule handler for one line.
///
/// The engine catches it, records it on the active document together with
/// the rule name and a line snippet, and continues with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A capture the handler relies on did not participate in the match.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A captured value could not be interpreted.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// The line is well-formed but not valid in the current cursor state.
    #[error("out of context: {0}")]
    OutOfContext(String),
}

/// Failure reading the line stream.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A capture file could not be opened or read.
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Registry mutation failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A parser with the same name is already registered.
    #[error("duplicate parser: {0}")]
    Duplicate(String),

    /// No registered factory carries this name.
    #[error("unknown parser: {0}")]
    Unknown(String),

    /// The parser's patterns failed to compile.
    #[error("parser {name} failed to build: {source}")]
    Build {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for results with [`ScanError`].
pub type Result<T> = std::result::Result<T, ScanError>;
