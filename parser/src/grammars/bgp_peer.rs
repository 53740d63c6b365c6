//! `display bgp peer`.
//!
//! A block opens either at the summary (`BGP local router ID : ...`) or
//! directly at the peer table header when the summary was cut from the
//! capture. A table header that follows the summary belongs to the same
//! block.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed, standard_boundary};
use crate::rule::{Fields, Rule, RuleSet};

pub struct BgpPeer {
    summary: Regex,
    table_header: Regex,
    rules: RuleSet<BgpPeerCursor>,
}

#[derive(Debug, Default)]
pub struct BgpPeerCursor {
    from_summary: bool,
    in_table: bool,
}

fn local_as(_: &mut BgpPeerCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("local_as", fields.value("local_as"));
    Ok(())
}

fn peer_counts(_: &mut BgpPeerCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total_peers", fields.int("total_peers")?);
    block.set("established_peers", fields.value("established"));
    Ok(())
}

fn table_header(cursor: &mut BgpPeerCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.in_table = true;
    Ok(())
}

fn peer(_: &mut BgpPeerCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("peers", fields.row());
    Ok(())
}

fn summary_complete(doc: &Document) -> Result<(), String> {
    let has = |key: &str| doc.get(key).is_some_and(|value| !value.is_null());
    if !(has("router_id") || has("local_as") || has("total_peers")) {
        // Table-only capture; there is no summary to check.
        return Ok(());
    }
    match (has("router_id"), has("local_as")) {
        (true, true) => Ok(()),
        (false, _) => Err("router ID missing from BGP summary".to_string()),
        (_, false) => Err("local AS missing from BGP summary".to_string()),
    }
}

fn peer_count_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total_peers", "peers")
}

static VALIDATIONS: &[ValidationRule] = &[
    ValidationRule::warning("router_id_and_as_present", summary_complete),
    ValidationRule::warning("peer_count_matches", peer_count_matches),
];

impl Grammar for BgpPeer {
    const NAME: &'static str = "bgp_peer";
    const PRIORITY: i32 = 40;
    type Cursor = BgpPeerCursor;

    fn build() -> Result<Self, regex::Error> {
        let header = r"^\s*Peer\s+V\s+AS\b";
        Ok(Self {
            summary: Regex::new(r"^\s*BGP local router ID\s*:\s*(?P<router_id>\S+)\s*$")?,
            table_header: Regex::new(header)?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "peer",
                    r"^\s*(?P<peer>\d{1,3}(?:\.\d{1,3}){3}|[0-9A-Fa-f]*:[0-9A-Fa-f:]+)\s+(?P<version>\d)\s+(?P<as>\d+(?:\.\d+)?)\s+(?P<msg_rcvd>\d+)\s+(?P<msg_sent>\d+)\s+(?P<out_q>\d+)\s+(?P<up_down>\S+)\s+(?P<state>\S+)(?:\s+(?P<prefixes_received>\d+))?\s*$",
                    peer,
                )?,
                Rule::new("local_as", r"^\s*Local AS number\s*:\s*(?P<local_as>\S+)\s*$", local_as)?,
                Rule::new(
                    "peer_counts",
                    r"^\s*Total number of peers\s*:\s*(?P<total_peers>\S+)(?:\s+Peers in established state\s*:\s*(?P<established>\d+))?\s*$",
                    peer_counts,
                )?,
                Rule::new("table_header", header, table_header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.summary, line).or_else(|| EntryMatch::capture(&self.table_header, line))
    }

    fn rules(&self) -> &RuleSet<BgpPeerCursor> {
        &self.rules
    }

    fn start(&self, cursor: &mut BgpPeerCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        match entry.get("router_id") {
            Some(router_id) => {
                cursor.from_summary = true;
                block.set("router_id", router_id);
            }
            None => cursor.in_table = true,
        }
        block.set("peers", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn ends_block(&self, cursor: &BgpPeerCursor, _: &Block, line: &str) -> Option<bool> {
        if cursor.from_summary && !cursor.in_table && self.table_header.is_match(line) {
            return Some(false);
        }
        Some(standard_boundary(self, line))
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BlockParser, GrammarParser};
    use crate::registry::ParserRegistry;
    use crate::scanner::scan_lines;

    fn feed(lines: &[&str]) -> (GrammarParser<BgpPeer>, Vec<bool>) {
        let mut parser = GrammarParser::<BgpPeer>::standalone().unwrap();
        let entry = parser.is_entry_point(lines[0]).unwrap();
        parser.start_block(lines[0], &entry);
        let handled = lines[1..].iter().map(|line| parser.parse_line(line)).collect();
        (parser, handled)
    }

    #[test]
    fn test_table_only_capture() {
        let (mut p, handled) = feed(&[
            "Peer      V AS  MsgRcvd  MsgSent  OutQ  Up/Down   State  PrefRcv",
            "10.0.0.1  4 65000 10 10 0 01:00:00 Established 5",
            "",
        ]);
        assert_eq!(handled, vec![true, true]);
        let doc = p.get_result().unwrap();
        let peers = doc.rows("peers");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0]["state"], "Established");
        assert_eq!(peers[0]["prefixes_received"], 5);
        assert_eq!(peers[0]["as"], 65000);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_summary_and_table_form_one_block() {
        let lines = [
            " BGP local router ID : 10.1.1.1",
            " Local AS number : 65000",
            " Total number of peers : 2                 Peers in established state : 1",
            "",
            "  Peer            V          AS  MsgRcvd  MsgSent  OutQ  Up/Down       State  PrefRcv",
            "  10.1.1.2        4       65000     1234     1235     0 01:00:00 Established        5",
            "  2001:db8::2     4       65001        0        0     0 00:10:00      Active        0",
        ];
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(&mut registry, lines);
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.get_str("router_id"), Some("10.1.1.1"));
        assert_eq!(doc.get_i64("local_as"), Some(65000));
        assert_eq!(doc.get_i64("established_peers"), Some(1));
        assert_eq!(doc.rows("peers").len(), 2);
        assert_eq!(doc.rows("peers")[1]["peer"], "2001:db8::2");
        assert!(doc.is_clean(), "{:?}", doc.warnings);
    }

    #[test]
    fn test_summary_validations() {
        let (mut p, _) = feed(&[
            " BGP local router ID : 10.1.1.1",
            " Total number of peers : 2",
            "  10.1.1.2        4       65000     1234     1235     0 01:00:00 Established        5",
        ]);
        let doc = p.get_result().unwrap();
        let rules: Vec<_> = doc.warnings.iter().filter_map(|w| w.rule.as_deref()).collect();
        assert_eq!(rules, vec!["router_id_and_as_present", "peer_count_matches"]);
    }

    #[test]
    fn test_repeated_table_header_splits() {
        let header = "Peer      V AS  MsgRcvd  MsgSent  OutQ  Up/Down   State  PrefRcv";
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            [
                header,
                "10.0.0.1  4 65000 10 10 0 01:00:00 Established 5",
                header,
                "10.0.0.2  4 65000 10 10 0 01:00:00 Established 7",
            ],
        );
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].rows("peers")[0]["prefixes_received"], 7);
    }
}
