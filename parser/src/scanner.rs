//! Single-pass block scanner.
//!
//! Walks a line stream once. While a parser is active each line is first
//! offered to its boundary check; a completing line harvests the block and
//! is then offered to entry-point search, since it may open the next block.
//! The scanner never feeds the completing line to the parser it completed.

use std::io::BufRead;

use serde::Serialize;

use netlog_core::Document;

use crate::error::Result;
use crate::normalize::normalize_line;
use crate::registry::ParserRegistry;

/// Line accounting for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub lines: usize,
    /// Lines that opened or were consumed by a block.
    pub lines_in_blocks: usize,
    /// Lines outside every block.
    pub dead_lines: usize,
    pub blocks: usize,
}

impl ScanStats {
    /// Share of lines that belonged to a block.
    pub fn coverage(&self) -> f64 {
        if self.lines == 0 {
            0.0
        } else {
            self.lines_in_blocks as f64 / self.lines as f64
        }
    }
}

/// Incremental scanner over one registry.
///
/// The scanner borrows the registry mutably for the whole pass, so a
/// registry can never drive two passes at once.
pub struct BlockScanner<'r> {
    registry: &'r mut ParserRegistry,
    active: Option<usize>,
    owner: Option<usize>,
    documents: Vec<Document>,
    stats: ScanStats,
}

impl<'r> BlockScanner<'r> {
    pub fn new(registry: &'r mut ParserRegistry) -> Self {
        Self {
            registry,
            active: None,
            owner: None,
            documents: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Scanner in which only `parser` may open blocks. Returns `None` when
    /// the registry has no parser by that name.
    pub fn owned_by(registry: &'r mut ParserRegistry, parser: &str) -> Option<Self> {
        let index = registry.position(parser)?;
        Some(Self::with_owner(registry, index))
    }

    /// `index` must be a valid position in `registry`.
    fn with_owner(registry: &'r mut ParserRegistry, index: usize) -> Self {
        let mut scanner = Self::new(registry);
        scanner.owner = Some(index);
        scanner
    }

    /// Offers one raw line to the pass.
    pub fn feed(&mut self, raw: &str) {
        let line = normalize_line(raw);
        self.stats.lines += 1;

        if let Some(index) = self.active {
            if self.registry.parser_at(index).is_block_complete(&line) {
                self.harvest(index);
            } else {
                self.registry.parser_at_mut(index).parse_line(&line);
                self.stats.lines_in_blocks += 1;
                return;
            }
        }

        let found = match self.owner {
            Some(index) => self
                .registry
                .parser_at(index)
                .is_entry_point(&line)
                .map(|entry| (index, entry)),
            None => self.registry.find_entry(&line),
        };
        match found {
            Some((index, entry)) => {
                tracing::debug!(parser = self.registry.parser_at(index).name(), line = %line, "block started");
                self.registry.parser_at_mut(index).start_block(&line, &entry);
                self.active = Some(index);
                self.stats.lines_in_blocks += 1;
            }
            None => self.stats.dead_lines += 1,
        }
    }

    fn harvest(&mut self, index: usize) {
        self.active = None;
        let parser = self.registry.parser_at_mut(index);
        if let Some(doc) = parser.get_result() {
            tracing::debug!(
                parser = parser.name(),
                warnings = doc.warnings.len(),
                errors = doc.errors.len(),
                "block harvested"
            );
            self.documents.push(doc);
            self.stats.blocks += 1;
        }
    }

    /// Returns the documents harvested so far, leaving the active block in
    /// progress.
    pub fn take_documents(&mut self) -> Vec<Document> {
        std::mem::take(&mut self.documents)
    }

    /// Ends the stream: harvests the active block and returns every
    /// document not yet taken.
    pub fn finish(&mut self) -> Vec<Document> {
        if let Some(index) = self.active {
            self.harvest(index);
        }
        self.take_documents()
    }

    /// Stops the pass: the in-flight block is discarded and the documents
    /// harvested before it are returned.
    pub fn cancel(&mut self) -> Vec<Document> {
        if let Some(index) = self.active.take() {
            self.registry.parser_at_mut(index).discard();
        }
        self.take_documents()
    }

    pub fn is_in_block(&self) -> bool {
        self.active.is_some()
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

impl Drop for BlockScanner<'_> {
    fn drop(&mut self) {
        // Never leave a half-built block behind in a reused registry.
        if let Some(index) = self.active.take() {
            self.registry.parser_at_mut(index).discard();
        }
    }
}

/// Scans an in-memory line sequence.
pub fn scan_lines<I, S>(registry: &mut ParserRegistry, lines: I) -> Vec<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    scan_lines_with_stats(registry, lines).0
}

pub fn scan_lines_with_stats<I, S>(registry: &mut ParserRegistry, lines: I) -> (Vec<Document>, ScanStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = BlockScanner::new(registry);
    for line in lines {
        scanner.feed(line.as_ref());
    }
    let documents = scanner.finish();
    (documents, scanner.stats())
}

/// Scans lines until `stop` returns `true`. A stopped pass returns the
/// blocks completed before the stop; the in-flight block is discarded.
pub fn scan_until<I, S, F>(registry: &mut ParserRegistry, lines: I, mut stop: F) -> Vec<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut() -> bool,
{
    let mut scanner = BlockScanner::new(registry);
    for line in lines {
        if stop() {
            tracing::info!(lines = scanner.stats().lines, "scan cancelled");
            return scanner.cancel();
        }
        scanner.feed(line.as_ref());
    }
    scanner.finish()
}

/// Scans a buffered reader line by line.
///
/// Invalid UTF-8 is replaced rather than rejected; device captures often
/// carry stray bytes.
///
/// # Errors
///
/// Returns [`ScanError::Io`](crate::ScanError::Io) when reading fails. The
/// in-flight block is discarded.
pub fn scan_reader<R: BufRead>(registry: &mut ParserRegistry, mut reader: R) -> Result<(Vec<Document>, ScanStats)> {
    let mut scanner = BlockScanner::new(registry);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = match reader.read_until(b'\n', &mut buf) {
            Ok(read) => read,
            Err(err) => {
                scanner.cancel();
                return Err(err.into());
            }
        };
        if read == 0 {
            break;
        }
        scanner.feed(&String::from_utf8_lossy(&buf));
    }
    let documents = scanner.finish();
    Ok((documents, scanner.stats()))
}

/// Picks the parser that best matches the leading lines and lets it own the
/// whole stream. Falls back to a regular scan when no parser matches the
/// sample.
pub fn scan_owned<S: AsRef<str>>(registry: &mut ParserRegistry, lines: &[S]) -> (Vec<Document>, ScanStats) {
    let sample_len = registry.options().header_sample_lines.min(lines.len());
    let owner = registry.rank(&lines[..sample_len]).first().map(|candidate| candidate.name);

    let Some(owner) = owner else {
        tracing::debug!("no parser matches the header sample; scanning all grammars");
        return scan_lines_with_stats(registry, lines);
    };
    let Some(index) = registry.position(owner) else {
        return scan_lines_with_stats(registry, lines);
    };
    tracing::debug!(parser = owner, "owner selected from header sample");

    let mut scanner = BlockScanner::with_owner(registry, index);
    for line in lines {
        scanner.feed(line.as_ref());
    }
    let documents = scanner.finish();
    (documents, scanner.stats())
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, Read};

    use super::*;
    use crate::ScanError;

    const ARP_HEADER: &str = "IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE";

    fn arp_lines() -> Vec<&'static str> {
        vec![
            "<R1>display arp",
            ARP_HEADER,
            "------------------------------------------------------------------------------",
            "10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1",
            "10.0.0.2        00e0-fc12-3457  15        D-0         GE0/0/2",
            "------------------------------------------------------------------------------",
            "Total:2         Dynamic:2       Static:0     Interface:0",
            "",
            "<R1>",
        ]
    }

    #[test]
    fn test_single_block_and_dead_lines() {
        let mut registry = ParserRegistry::builtin();
        let (docs, stats) = scan_lines_with_stats(&mut registry, arp_lines());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, "arp");
        assert_eq!(docs[0].rows("entries").len(), 2);
        assert!(docs[0].is_clean(), "{:?}", docs[0].warnings);
        assert_eq!(stats.lines, 9);
        assert_eq!(stats.dead_lines, 2);
        assert_eq!(stats.lines_in_blocks, 7);
        assert_eq!(stats.blocks, 1);
    }

    #[test]
    fn test_end_of_stream_harvests_last_block() {
        let mut registry = ParserRegistry::builtin();
        let lines = &arp_lines()[1..5];
        let docs = scan_lines(&mut registry, lines);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rows("entries").len(), 2);
    }

    #[test]
    fn test_back_to_back_identical_headers_split() {
        let mut registry = ParserRegistry::builtin();
        let lines = [
            ARP_HEADER,
            "10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1",
            ARP_HEADER,
            "10.0.0.9        00e0-fc12-3459  20        D-0         GE0/0/9",
        ];
        let docs = scan_lines(&mut registry, lines);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].rows("entries")[0]["ip"], "10.0.0.1");
        assert_eq!(docs[1].rows("entries")[0]["ip"], "10.0.0.9");
    }

    #[test]
    fn test_scan_is_deterministic() {
        let mut registry = ParserRegistry::builtin();
        let first = serde_json::to_string(&scan_lines(&mut registry, arp_lines())).unwrap();
        let second = serde_json::to_string(&scan_lines(&mut registry, arp_lines())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancel_discards_in_flight_block() {
        let mut registry = ParserRegistry::builtin();
        let mut scanner = BlockScanner::new(&mut registry);
        for line in &arp_lines()[..4] {
            scanner.feed(line);
        }
        assert!(scanner.is_in_block());
        assert!(scanner.cancel().is_empty());
        assert!(!scanner.is_in_block());
        drop(scanner);
        assert!(!registry.get("arp").unwrap().is_active());
    }

    #[test]
    fn test_scan_until_returns_completed_blocks_only() {
        let mut registry = ParserRegistry::builtin();
        let mut lines = arp_lines();
        lines.extend([ARP_HEADER, "10.0.0.3        00e0-fc12-3458  20        D-0         GE0/0/3"]);
        let mut fed = 0;
        let docs = scan_until(&mut registry, lines, || {
            fed += 1;
            fed > 10
        });
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rows("entries").len(), 2);
    }

    #[test]
    fn test_take_documents_streams_results() {
        let mut registry = ParserRegistry::builtin();
        let mut scanner = BlockScanner::new(&mut registry);
        for line in arp_lines() {
            scanner.feed(line);
        }
        assert_eq!(scanner.take_documents().len(), 1);
        assert!(scanner.finish().is_empty());
    }

    #[test]
    fn test_scan_reader_normalizes_lines() {
        let mut registry = ParserRegistry::builtin();
        let text = arp_lines().join("\r\n");
        let (docs, stats) = scan_reader(&mut registry, BufReader::new(text.as_bytes())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rows("entries")[1]["interface"], "GE0/0/2");
        assert_eq!(stats.lines, 9);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_scan_reader_propagates_io_errors() {
        let mut registry = ParserRegistry::builtin();
        let result = scan_reader(&mut registry, BufReader::new(FailingReader));
        assert!(matches!(result, Err(ScanError::Io(_))));
    }

    #[test]
    fn test_owner_mode_ignores_other_grammars() {
        let mut registry = ParserRegistry::builtin();
        // arp: 2/6 + 0.05, bgp_routing_table: 1/6 + 0.05 + 0.05
        let lines = [
            ARP_HEADER,
            "10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1",
            ARP_HEADER,
            "10.0.0.2        00e0-fc12-3457  15        D-0         GE0/0/2",
            "",
            "Total Number of Routes: 1",
        ];
        let (docs, stats) = scan_owned(&mut registry, &lines);
        let kinds: Vec<&str> = docs.iter().map(|doc| doc.kind.as_str()).collect();
        assert_eq!(kinds, ["arp", "arp"]);
        assert_eq!(docs[1].rows("entries")[0]["ip"], "10.0.0.2");
        assert_eq!(stats.dead_lines, 0);
    }

    #[test]
    fn test_owner_mode_priority_boost_breaks_equal_matches() {
        let mut registry = ParserRegistry::builtin();
        // Both headers match once; only the BGP grammar has a priority below 50.
        let lines = [
            ARP_HEADER,
            "10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1",
            "",
            "Total Number of Routes: 1",
        ];
        let ranked = registry.rank(&lines);
        assert_eq!(ranked[0].name, "bgp_routing_table");
        assert!((ranked[0].confidence - 0.35).abs() < 1e-9);
        assert_eq!(ranked[1].name, "arp");
        assert!((ranked[1].confidence - 0.30).abs() < 1e-9);

        let (docs, stats) = scan_owned(&mut registry, &lines);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, "bgp_routing_table");
        assert_eq!(stats.dead_lines, 3);
    }

    #[test]
    fn test_owned_by_unknown_parser() {
        let mut registry = ParserRegistry::builtin();
        assert!(BlockScanner::owned_by(&mut registry, "no_such_parser").is_none());
        assert!(BlockScanner::owned_by(&mut registry, "arp").is_some());
    }

    #[test]
    fn test_owner_mode_falls_back_without_candidates() {
        let mut registry = ParserRegistry::builtin();
        let mut lines = vec!["banner"; 12];
        lines.extend(arp_lines());
        let (docs, _) = scan_owned(&mut registry, &lines);
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_stats_coverage() {
        let stats = ScanStats {
            lines: 4,
            lines_in_blocks: 3,
            dead_lines: 1,
            blocks: 1,
        };
        assert!((stats.coverage() - 0.75).abs() < f64::EPSILON);
        assert_eq!(ScanStats::default().coverage(), 0.0);
    }
}
