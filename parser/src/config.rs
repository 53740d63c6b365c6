//! Scan configuration.
//!
//! Defines the YAML-serializable configuration that controls which parsers
//! are loaded into a registry and how the scanner reports problems.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! disabled_parsers:
//!   - current_config
//! scanner:
//!   header_sample_lines: 10
//!   warning_snippet_len: 80
//! jobs: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of leading lines sampled when ranking parsers.
pub const DEFAULT_HEADER_SAMPLE_LINES: usize = 10;

/// Default maximum length of a line snippet stored in a warning.
pub const DEFAULT_WARNING_SNIPPET_LEN: usize = 80;

/// Settings every parser in a registry shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerOptions {
    /// Leading lines sampled by [`ParserRegistry::rank`](crate::ParserRegistry::rank).
    pub header_sample_lines: usize,
    /// Characters of an offending line kept in its diagnostic.
    pub warning_snippet_len: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            header_sample_lines: DEFAULT_HEADER_SAMPLE_LINES,
            warning_snippet_len: DEFAULT_WARNING_SNIPPET_LEN,
        }
    }
}

/// Top-level scan configuration.
///
/// # Examples
///
/// ```
/// use netlog_parser::ScanConfig;
///
/// let config: ScanConfig = serde_yaml::from_str("disabled_parsers: [clock]").unwrap();
/// assert!(!config.is_enabled("clock"));
/// assert!(config.is_enabled("arp"));
/// assert_eq!(config.scanner.header_sample_lines, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Parser names left out of the registry.
    pub disabled_parsers: Vec<String>,
    pub scanner: ScannerOptions,
    /// Parallel file jobs; `None` uses the number of CPUs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            disabled_parsers: Vec::new(),
            scanner: ScannerOptions::default(),
            jobs: None,
        }
    }
}

impl ScanConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if parsing fails, or [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.header_sample_lines == 0 {
            return Err(ConfigError::Invalid(
                "scanner.header_sample_lines must be at least 1".to_string(),
            ));
        }
        if self.scanner.warning_snippet_len < 8 {
            return Err(ConfigError::Invalid(
                "scanner.warning_snippet_len must be at least 8".to_string(),
            ));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Returns `true` unless `parser` is listed in `disabled_parsers`.
    pub fn is_enabled(&self, parser: &str) -> bool {
        !self.disabled_parsers.iter().any(|name| name == parser)
    }
}
