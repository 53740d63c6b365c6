//! `display mac-address`.
//!
//! The table is printed once per slot, each under its own
//! `MAC address table of slot N:` header, so every slot is its own block.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct MacAddress {
    entry: Regex,
    rules: RuleSet<()>,
}

fn entry(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("entries", fields.row());
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
    check_declared_count(doc, "total", "entries")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("total_matches_entries", total_matches)];

impl Grammar for MacAddress {
    const NAME: &'static str = "mac_address";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*MAC address table of slot\s+(?P<slot>\d+)\s*:\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "entry",
                    r"^\s*(?P<mac>[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4})\s+(?P<vlan>\S+)\s+(?:(?P<pevlan>\S+)\s+(?P<cevlan>\S+)\s+)?(?P<port>\S+)\s+(?P<type>\S+)(?:\s+(?P<lsp>\S+))?\s*$",
                    entry,
                )?,
                Rule::new(
                    "total",
                    r"^\s*Total matching items on slot\s+\d+\s+displayed\s*=\s*(?P<total>\d+)\s*$",
                    total,
                )?,
                Rule::new("header", r"^\s*(?:MAC Address\s+VLAN/|VSI/SI\b)", header)?,
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
        block.set_text("slot", entry.get("slot").unwrap_or_default());
        block.set("entries", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
