//! Parser registry.
//!
//! Instantiates every grammar once from a static registration list, answers
//! entry-point queries in registration order, and ranks parsers against a
//! header sample when one parser must own a whole file.

use std::fmt;

use serde::Serialize;

use crate::block::EntryMatch;
use crate::config::{ScanConfig, ScannerOptions};
use crate::diagnostics::Diagnostics;
use crate::error::RegistryError;
use crate::grammar::{BlockParser, Grammar, GrammarParser};
use crate::grammars::BUILTIN;

/// Confidence added for parsers with a priority below
/// [`LOW_PRIORITY_THRESHOLD`].
pub const PRIORITY_BOOST: f64 = 0.05;
/// Confidence added for parsers that carry validation rules.
pub const VALIDATION_BOOST: f64 = 0.05;
pub const LOW_PRIORITY_THRESHOLD: i32 = 50;

/// Builds one boxed parser.
pub type BuildFn = fn(&Diagnostics, ScannerOptions) -> Result<Box<dyn BlockParser>, regex::Error>;

/// Constructor entry in a registration list.
#[derive(Clone, Copy)]
pub struct ParserFactory {
    pub name: &'static str,
    pub priority: i32,
    build: BuildFn,
}

impl fmt::Debug for ParserFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserFactory")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl ParserFactory {
    pub const fn new(name: &'static str, priority: i32, build: BuildFn) -> Self {
        Self {
            name,
            priority,
            build,
        }
    }

    /// Factory for a [`Grammar`] wrapped in the shared base parser.
    pub const fn of<G: Grammar>() -> Self {
        Self::new(G::NAME, G::PRIORITY, build_grammar::<G>)
    }

    pub fn build(
        &self,
        diagnostics: &Diagnostics,
        options: ScannerOptions,
    ) -> Result<Box<dyn BlockParser>, RegistryError> {
        (self.build)(diagnostics, options).map_err(|source| RegistryError::Build {
            name: self.name,
            source,
        })
    }
}

fn build_grammar<G: Grammar>(
    diagnostics: &Diagnostics,
    options: ScannerOptions,
) -> Result<Box<dyn BlockParser>, regex::Error> {
    Ok(Box::new(GrammarParser::<G>::build(diagnostics.clone(), options)?))
}

/// One parser ranked against a header sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: &'static str,
    pub priority: i32,
    pub matched: usize,
    pub sampled: usize,
    pub confidence: f64,
}

/// Per-parser flags reported by [`ParserRegistry::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserInfo {
    pub name: &'static str,
    pub priority: i32,
    pub rules: usize,
    pub has_validations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub loaded: usize,
    pub with_validations: usize,
    /// Parsers that failed to build.
    pub failed: Vec<&'static str>,
    pub disabled: Vec<String>,
    /// Loaded parsers by ascending priority, ties in registration order.
    pub parsers: Vec<ParserInfo>,
}

struct Entry {
    factory: ParserFactory,
    parser: Box<dyn BlockParser>,
}

/// The set of parsers one scanning pass uses.
///
/// A registry owns stateful parser instances and must not be shared by
/// concurrent passes; use [`ParserRegistry::fresh`] to get an independent
/// copy per pass.
pub struct ParserRegistry {
    factories: Vec<ParserFactory>,
    entries: Vec<Entry>,
    failed: Vec<&'static str>,
    diagnostics: Diagnostics,
    config: ScanConfig,
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.names())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl ParserRegistry {
    /// Loads every built-in grammar that `config` leaves enabled.
    pub fn load(diagnostics: Diagnostics, config: &ScanConfig) -> Self {
        for name in &config.disabled_parsers {
            if !BUILTIN.iter().any(|factory| factory.name == name) {
                tracing::warn!(parser = %name, "disabled parser is not a known grammar");
            }
        }
        Self::with_factories(BUILTIN, diagnostics, config)
    }

    /// Registry with every built-in grammar, no-op diagnostics and default
    /// options.
    pub fn builtin() -> Self {
        Self::load(Diagnostics::noop(), &ScanConfig::default())
    }

    /// Loads an explicit registration list.
    pub fn with_factories(factories: &[ParserFactory], diagnostics: Diagnostics, config: &ScanConfig) -> Self {
        let mut registry = Self {
            factories: Vec::new(),
            entries: Vec::new(),
            failed: Vec::new(),
            diagnostics,
            config: config.clone(),
        };
        for factory in factories {
            if !registry.config.is_enabled(factory.name) {
                tracing::debug!(parser = factory.name, "parser disabled by configuration");
                continue;
            }
            if registry.factories.iter().any(|known| known.name == factory.name) {
                tracing::warn!(parser = factory.name, "duplicate registration ignored");
                continue;
            }
            registry.factories.push(*factory);
            registry.instantiate(*factory);
        }
        tracing::debug!(
            loaded = registry.entries.len(),
            failed = registry.failed.len(),
            "parser registry loaded"
        );
        registry
    }

    fn instantiate(&mut self, factory: ParserFactory) -> bool {
        match factory.build(&self.diagnostics, self.config.scanner) {
            Ok(parser) => {
                self.entries.push(Entry { factory, parser });
                true
            }
            Err(err) => {
                tracing::error!(parser = factory.name, error = %err, "parser failed to load; skipped");
                self.failed.push(factory.name);
                false
            }
        }
    }

    /// Adds a parser at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken and
    /// [`RegistryError::Build`] when its patterns fail to compile.
    pub fn register(&mut self, factory: ParserFactory) -> Result<(), RegistryError> {
        if self.factories.iter().any(|known| known.name == factory.name) {
            return Err(RegistryError::Duplicate(factory.name.to_string()));
        }
        let parser = factory.build(&self.diagnostics, self.config.scanner)?;
        self.factories.push(factory);
        self.entries.push(Entry { factory, parser });
        Ok(())
    }

    /// Rebuilds every parser from the registered factories, dropping all
    /// in-flight state.
    pub fn reload(&mut self) {
        self.entries.clear();
        self.failed.clear();
        let factories = self.factories.clone();
        for factory in factories {
            self.instantiate(factory);
        }
        tracing::info!(loaded = self.entries.len(), "parser registry reloaded");
    }

    /// An independent registry built from the same factories, for a
    /// concurrent pass.
    pub fn fresh(&self) -> Self {
        Self::with_factories(&self.factories, self.diagnostics.clone(), &self.config)
    }

    /// The registration list this registry was loaded from, minus disabled
    /// and duplicate entries.
    pub fn factories(&self) -> &[ParserFactory] {
        &self.factories
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn options(&self) -> ScannerOptions {
        self.config.scanner
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parser names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.factory.name).collect()
    }

    /// Parser names by ascending priority, ties in registration order.
    pub fn names_by_priority(&self) -> Vec<&'static str> {
        let mut order: Vec<_> = self.entries.iter().map(|entry| &entry.factory).collect();
        order.sort_by_key(|factory| factory.priority);
        order.into_iter().map(|factory| factory.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn BlockParser> {
        self.position(name).map(|index| self.entries[index].parser.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn BlockParser> {
        let index = self.position(name)?;
        Some(self.entries[index].parser.as_mut())
    }

    /// Builds an unshared parser instance by name.
    pub fn create_fresh(&self, name: &str) -> Result<Box<dyn BlockParser>, RegistryError> {
        let factory = self
            .factories
            .iter()
            .find(|factory| factory.name == name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        factory.build(&self.diagnostics, self.config.scanner)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.factory.name == name)
    }

    /// Finds the first parser, in registration order, whose entry point
    /// matches `line`.
    pub(crate) fn find_entry(&self, line: &str) -> Option<(usize, EntryMatch)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(index, entry)| entry.parser.is_entry_point(line).map(|found| (index, found)))
    }

    pub(crate) fn parser_at(&self, index: usize) -> &dyn BlockParser {
        self.entries[index].parser.as_ref()
    }

    pub(crate) fn parser_at_mut(&mut self, index: usize) -> &mut dyn BlockParser {
        self.entries[index].parser.as_mut()
    }

    /// Scores every parser against a header sample.
    ///
    /// Confidence is the share of sampled lines the parser's entry point
    /// matches, plus [`PRIORITY_BOOST`] for priorities below
    /// [`LOW_PRIORITY_THRESHOLD`] and [`VALIDATION_BOOST`] for parsers with
    /// validation rules, clamped to `[0, 1]`. Parsers matching no line are
    /// left out. Sorted by confidence, then priority, then registration
    /// order.
    pub fn rank<S: AsRef<str>>(&self, sample: &[S]) -> Vec<Candidate> {
        let sampled = sample.len();
        if sampled == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let matched = sample
                    .iter()
                    .filter(|line| entry.parser.is_entry_point(line.as_ref()).is_some())
                    .count();
                if matched == 0 {
                    return None;
                }
                let mut confidence = matched as f64 / sampled as f64;
                if entry.factory.priority < LOW_PRIORITY_THRESHOLD {
                    confidence += PRIORITY_BOOST;
                }
                if entry.parser.has_validations() {
                    confidence += VALIDATION_BOOST;
                }
                Some(Candidate {
                    name: entry.factory.name,
                    priority: entry.factory.priority,
                    matched,
                    sampled,
                    confidence: confidence.clamp(0.0, 1.0),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.priority.cmp(&b.priority))
        });
        candidates
    }

    pub fn stats(&self) -> RegistryStats {
        let mut parsers: Vec<ParserInfo> = self
            .entries
            .iter()
            .map(|entry| ParserInfo {
                name: entry.factory.name,
                priority: entry.factory.priority,
                rules: entry.parser.rule_names().len(),
                has_validations: entry.parser.has_validations(),
            })
            .collect();
        parsers.sort_by_key(|info| info.priority);

        RegistryStats {
            loaded: self.entries.len(),
            with_validations: parsers.iter().filter(|info| info.has_validations).count(),
            failed: self.failed.clone(),
            disabled: self.config.disabled_parsers.clone(),
            parsers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken(_: &Diagnostics, _: ScannerOptions) -> Result<Box<dyn BlockParser>, regex::Error> {
        Err(regex::Regex::new("(unclosed").unwrap_err())
    }

    #[test]
    fn test_builtin_registry_has_unique_names() {
        let registry = ParserRegistry::builtin();
        let mut names = registry.names();
        assert_eq!(names.len(), BUILTIN.len());
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN.len());
        assert!(registry.stats().failed.is_empty());
    }

    #[test]
    fn test_failing_factory_is_skipped() {
        let factories = [
            BUILTIN[0],
            ParserFactory::new("broken", 10, broken),
            BUILTIN[1],
        ];
        let registry = ParserRegistry::with_factories(&factories, Diagnostics::noop(), &ScanConfig::default());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stats().failed, vec!["broken"]);
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn test_disabled_parsers_are_not_loaded() {
        let config = ScanConfig {
            disabled_parsers: vec!["arp".to_string(), "no_such_parser".to_string()],
            ..ScanConfig::default()
        };
        let registry = ParserRegistry::load(Diagnostics::noop(), &config);
        assert!(registry.get("arp").is_none());
        assert!(registry.get("bgp_peer").is_some());
        assert_eq!(registry.len(), BUILTIN.len() - 1);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ParserRegistry::builtin();
        let arp = *BUILTIN.iter().find(|factory| factory.name == "arp").unwrap();
        assert!(matches!(registry.register(arp), Err(RegistryError::Duplicate(name)) if name == "arp"));
        assert!(matches!(
            registry.register(ParserFactory::new("broken", 1, broken)),
            Err(RegistryError::Build { name: "broken", .. })
        ));
    }

    #[test]
    fn test_register_appends_runtime_parser() {
        let mut registry = ParserRegistry::with_factories(&BUILTIN[..1], Diagnostics::noop(), &ScanConfig::default());
        let arp = *BUILTIN.iter().find(|factory| factory.name == "arp").unwrap();
        registry.register(arp).unwrap();
        assert_eq!(registry.names().last(), Some(&"arp"));
        registry.reload();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_fresh_is_unshared() {
        let mut registry = ParserRegistry::builtin();
        let header = "IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE";
        let entry = registry.get("arp").unwrap().is_entry_point(header).unwrap();
        registry.get_mut("arp").unwrap().start_block(header, &entry);

        let fresh = registry.create_fresh("arp").unwrap();
        assert!(!fresh.is_active());
        assert!(registry.get("arp").unwrap().is_active());
        assert!(matches!(registry.create_fresh("nope"), Err(RegistryError::Unknown(_))));
    }

    #[test]
    fn test_fresh_registry_is_independent() {
        let registry = ParserRegistry::builtin();
        let other = registry.fresh();
        assert_eq!(registry.names(), other.names());
    }

    #[test]
    fn test_rank_scores_and_orders() {
        let registry = ParserRegistry::builtin();
        let sample = [
            "<R1>display arp",
            "IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE",
            "10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1",
            "",
        ];
        let ranked = registry.rank(&sample);
        assert_eq!(ranked.len(), 1);
        let arp = &ranked[0];
        assert_eq!(arp.name, "arp");
        assert_eq!(arp.matched, 1);
        assert_eq!(arp.sampled, 4);
        // 1/4 plus the validation boost
        assert!((arp.confidence - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_rank_empty_sample() {
        let registry = ParserRegistry::builtin();
        assert!(registry.rank::<&str>(&[]).is_empty());
        assert!(registry.rank(&["nothing known"]).is_empty());
    }

    #[test]
    fn test_names_by_priority_is_stable() {
        let registry = ParserRegistry::builtin();
        let ordered = registry.names_by_priority();
        let priorities: Vec<i32> = ordered
            .iter()
            .map(|name| registry.get(name).unwrap().priority())
            .collect();
        assert!(priorities.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(registry.stats().parsers.len(), registry.len());
    }
}
