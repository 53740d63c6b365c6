//! `display isis peer`.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct IsisPeer {
    entry: Regex,
    rules: RuleSet<()>,
}

fn peer(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("peers", fields.row());
    Ok(())
}

fn total(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total", fields.int("total")?);
    Ok(())
}

fn header(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "peers")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("peer_total_matches", total_matches)];

impl Grammar for IsisPeer {
    const NAME: &'static str = "isis_peer";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Peer information for ISIS\((?P<process>\d+)\)\s*$")?,
            rules: RuleSet::new(vec![
                // Point-to-point circuits print `--` for the priority.
                Rule::new(
                    "peer",
                    r"^\s*(?P<system_id>[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4})\s+(?P<interface>\S+)\s+(?P<circuit_id>\S+)\s+(?P<state>\S+)\s+(?P<hold_time_seconds>\d+)s\s+(?P<type>\S+)(?:\s+(?:(?P<priority>\d+)|--))?\s*$",
                    peer,
                )?,
                Rule::new("total", r"^\s*Total Peer\(s\)\s*:\s*(?P<total>\d+)\s*$", total)?,
                Rule::new("header", r"^\s*System Id\s+Interface\s+Circuit Id\b", header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("process", entry.get("process").unwrap_or_default());
        block.set("peers", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
