//! `display ip interface brief`.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet, trimmed_value};

pub struct IpInterfaceBrief {
    entry: Regex,
    rules: RuleSet<()>,
}

fn count(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let layer = fields.require("layer")?.to_ascii_lowercase();
    let state = fields.require("state")?.to_ascii_lowercase();
    block.set(&format!("{layer}_{state}"), fields.int("count")?);
    Ok(())
}

fn row(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["interface"]);
    match fields.require("address")? {
        "unassigned" => {
            row.insert("ip_address".to_string(), Value::Null);
            row.insert("mask_length".to_string(), Value::Null);
        }
        address => {
            let (ip, mask) = address.split_once('/').unwrap_or((address, ""));
            row.insert("ip_address".to_string(), ip.into());
            row.insert("mask_length".to_string(), trimmed_value(mask));
        }
    }
    row.extend(fields.row_of(&["physical", "protocol", "vpn"]));
    block.push_row("interfaces", row);
    Ok(())
}

fn ignore(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn physical_up_within_rows(doc: &Document) -> Result<(), String> {
    let Some(up) = doc.get_i64("physical_up") else {
        return Ok(());
    };
    let rows = doc.rows("interfaces").len() as i64;
    if up <= rows {
        Ok(())
    } else {
        Err(format!("{up} interfaces reported physically up but only {rows} rows parsed"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("physical_up_within_rows", physical_up_within_rows)];

impl Grammar for IpInterfaceBrief {
    const NAME: &'static str = "ip_interface_brief";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*\*down:\s*administratively down\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "count",
                    r"^\s*The number of interface that is (?P<state>UP|DOWN) in (?P<layer>Physical|Protocol) is (?P<count>\d+)\s*$",
                    count,
                )?,
                Rule::new(
                    "row",
                    r"^\s*(?P<interface>[A-Za-z][\w\-./:]*)\s+(?P<address>unassigned|\d{1,3}(?:\.\d{1,3}){3}/\d{1,2})\s+(?P<physical>\S+)\s+(?P<protocol>\S+)(?:\s+(?P<vpn>\S+))?\s*$",
                    row,
                )?,
                Rule::new("legend", r"^\s*(?:[\^#]down|\([A-Za-z]\)):", ignore)?,
                Rule::new("header", r"^\s*Interface\s+IP Address/Mask\s+Physical\s+Protocol\b", ignore)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("interfaces", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
