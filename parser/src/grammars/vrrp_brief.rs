//! `display vrrp brief`.
//!
//! The first line is both the entry point and data (the state totals).
//! A group with several virtual addresses prints the extra addresses alone
//! on the following lines.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

const TOTALS_PATTERN: &str = r"^\s*Total:\s*(?P<total>\d+)\s+Master:\s*(?P<master>\d+)\s+Backup:\s*(?P<backup>\d+)\s+Non-active:\s*(?P<non_active>\d+)\s*$";

pub struct VrrpBrief {
    entry: Regex,
    rules: RuleSet<()>,
}

fn totals(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    for key in ["total", "master", "backup", "non_active"] {
        block.set(key, fields.value(key));
    }
    Ok(())
}

fn group(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["vrid", "state", "interface", "type"]);
    row.insert("virtual_ips".to_string(), Value::Array(vec![fields.value("virtual_ip")]));
    block.push_row("groups", row);
    Ok(())
}

fn extra_address(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let address = fields.value("virtual_ip");
    let ips = block
        .last_row_mut("groups")
        .and_then(|row| row.get_mut("virtual_ips"))
        .and_then(Value::as_array_mut);
    match ips {
        Some(ips) => ips.push(address),
        None => block.warn_orphan(fields.line(), "virtual address without a VRRP group"),
    }
    Ok(())
}

fn header(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "groups")
}

fn master_matches(doc: &Document) -> Result<(), String> {
    let Some(declared) = doc.get_i64("master") else {
        return Ok(());
    };
    let masters = doc
        .rows("groups")
        .iter()
        .filter(|group| group.get("state").and_then(Value::as_str) == Some("Master"))
        .count() as i64;
    if masters == declared {
        Ok(())
    } else {
        Err(format!("header declares {declared} master groups but {masters} were parsed"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[
    ValidationRule::warning("group_total_matches", total_matches),
    ValidationRule::warning("master_count_matches", master_matches),
];

impl Grammar for VrrpBrief {
    const NAME: &'static str = "vrrp_brief";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(TOTALS_PATTERN)?,
            rules: RuleSet::new(vec![
                Rule::new("totals", TOTALS_PATTERN, totals)?,
                Rule::new(
                    "group",
                    r"^\s*(?P<vrid>\d+)\s+(?P<state>\S+)\s+(?P<interface>\S+)\s+(?P<type>\S+)\s+(?P<virtual_ip>\d{1,3}(?:\.\d{1,3}){3})\s*$",
                    group,
                )?,
                Rule::new("extra_address", r"^\s+(?P<virtual_ip>\d{1,3}(?:\.\d{1,3}){3})\s*$", extra_address)?,
                Rule::new("header", r"^\s*VRID\s+State\s+Interface\b", header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("groups", Value::Array(Vec::new()));
        Seed::ParseEntryLine
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
