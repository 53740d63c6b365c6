//! `display arp`.
//!
//! Rows may wrap a `VLAN/CEVLAN` continuation onto the next line; it is
//! attached to the previous entry. A continuation with no entry before it
//! is dropped with a warning.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Arp {
    entry: Regex,
    rules: RuleSet<ArpCursor>,
}

#[derive(Debug, Default)]
pub struct ArpCursor {
    last_entry: Option<usize>,
}

fn entry(cursor: &mut ArpCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row();
    row.insert("vlan".to_string(), Value::Null);
    block.push_row("entries", row);
    cursor.last_entry = Some(block.row_count("entries") - 1);
    Ok(())
}

fn vlan(cursor: &mut ArpCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let Some(row) = block.record_mut("entries", cursor.last_entry) else {
        block.warn_orphan(fields.line(), "VLAN continuation without a preceding ARP entry");
        return Ok(());
    };
    row.insert("vlan".to_string(), fields.value("vlan"));
    row.insert("cevlan".to_string(), fields.value("cevlan"));
    if let Some(pvc) = fields.get("pvc") {
        row.insert("pvc".to_string(), pvc.into());
    }
    Ok(())
}

fn totals(_: &mut ArpCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total", fields.int("total")?);
    block.set("dynamic", fields.value("dynamic"));
    block.set("static", fields.value("static"));
    block.set("interface", fields.value("interface"));
    Ok(())
}

fn legend(_: &mut ArpCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "entries")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("total_matches_entries", total_matches)];

impl Grammar for Arp {
    const NAME: &'static str = "arp";
    type Cursor = ArpCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*IP ADDRESS\s+MAC ADDRESS\b")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "entry",
                    r"^\s*(?P<ip>\d{1,3}(?:\.\d{1,3}){3})\s+(?P<mac>[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4})\s+(?:(?P<expire>\d+)\s+)?(?P<type>I\s+-|[A-Z]+(?:-\S*)?)\s+(?P<interface>\S+)(?:\s+(?P<vpn_instance>\S+))?\s*$",
                    entry,
                )?,
                Rule::new("vlan", r"^\s+(?P<vlan>\d+)/(?P<cevlan>\S+)(?:\s+(?P<pvc>\S+))?\s*$", vlan)?,
                Rule::new(
                    "totals",
                    r"^\s*Total:\s*(?P<total>\d+)\s+Dynamic:\s*(?P<dynamic>\d+)\s+Static:\s*(?P<static>\d+)(?:\s+Interface:\s*(?P<interface>\d+))?",
                    totals,
                )?,
                Rule::new("legend", r"^\s*VLAN/CEVLAN\s+PVC\s*$", legend)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<ArpCursor> {
        &self.rules
    }

    fn start(&self, _: &mut ArpCursor, block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("entries", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BlockParser, GrammarParser};
    use netlog_core::DiagnosticKind;

    const HEADER: &str = "IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE";

    fn parser() -> GrammarParser<Arp> {
        let mut parser = GrammarParser::<Arp>::standalone().unwrap();
        let entry = parser.is_entry_point(HEADER).unwrap();
        parser.start_block(HEADER, &entry);
        parser
    }

    #[test]
    fn test_rows_and_vlan_continuation() {
        let mut p = parser();
        for line in [
            "                                          VLAN/CEVLAN PVC",
            "------------------------------------------------------------------------------",
            "10.1.1.1        00e0-fc12-3456            I -         GE0/0/1",
            "10.1.1.2        00e0-fc12-3457  20        D-0         GE0/0/1     vpna",
            "                                          10/-",
            "------------------------------------------------------------------------------",
            "Total:2         Dynamic:1       Static:0     Interface:1",
        ] {
            p.parse_line(line);
        }
        let doc = p.get_result().unwrap();
        assert!(doc.is_clean(), "{:?}", doc.warnings);

        let entries = doc.rows("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["type"], "I -");
        assert_eq!(entries[0]["expire"], Value::Null);
        assert_eq!(entries[1]["expire"], 20);
        assert_eq!(entries[1]["vpn_instance"], "vpna");
        assert_eq!(entries[1]["vlan"], 10);
        assert_eq!(entries[1]["cevlan"], "-");
        assert_eq!(doc.get_i64("total"), Some(2));
    }

    #[test]
    fn test_malformed_row_is_not_handled() {
        let mut p = parser();
        assert!(p.parse_line("10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1"));
        assert!(!p.parse_line("10.0.0.2  00e0-fc12-3457"));
        let doc = p.get_result().unwrap();
        assert_eq!(doc.rows("entries").len(), 1);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::UnrecognizedLine);
    }

    #[test]
    fn test_orphan_vlan_is_dropped_with_warning() {
        let mut p = parser();
        assert!(p.parse_line("                                          10/-"));
        let doc = p.get_result().unwrap();
        assert!(doc.rows("entries").is_empty());
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::OrphanContinuation);
    }

    #[test]
    fn test_total_mismatch_is_flagged() {
        let mut p = parser();
        p.parse_line("10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1");
        p.parse_line("Total:3         Dynamic:3       Static:0     Interface:0");
        let doc = p.get_result().unwrap();
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::ValidationFailed);
    }

    #[test]
    fn test_unparseable_line_mid_block_keeps_other_rows() {
        let mut p = parser();
        p.parse_line("10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1");
        p.parse_line("garbled ### output");
        p.parse_line("10.0.0.2        00e0-fc12-3457  20        D-0         GE0/0/2");
        let doc = p.get_result().unwrap();
        assert_eq!(doc.rows("entries").len(), 2);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].line.as_deref(), Some("garbled ### output"));
    }
}
