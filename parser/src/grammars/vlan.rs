//! `display vlan`.
//!
//! Two tables describe the same VLANs: the ports table (`VID Type Ports`),
//! whose port lists wrap onto indented continuation lines, and the property
//! table (`VID Status Property ...`). Property rows are merged into the
//! VLAN with the same VID.
//!
//! A property row also fits the generic ports-row pattern, so the property
//! rule must be listed first.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use netlog_core::{Document, Row, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

static PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<mode>UT|TG|MP|ST):)?(?P<interface>[^\s(]+)(?:\((?P<state>[A-Z])\))?$")
        .expect("static regex must compile")
});

pub struct Vlan {
    entry: Regex,
    rules: RuleSet<VlanCursor>,
}

#[derive(Debug, Default)]
pub struct VlanCursor {
    last_vlan: Option<usize>,
    mode: Option<String>,
}

/// Parses port tokens such as `UT:GE0/0/1(U)`. A token without a mode
/// prefix inherits the mode of the token before it.
fn parse_ports(text: &str, mode: &mut Option<String>) -> Vec<Value> {
    text.split_whitespace()
        .filter_map(|token| PORT.captures(token))
        .map(|caps| {
            if let Some(prefix) = caps.name("mode") {
                *mode = Some(prefix.as_str().to_string());
            }
            let mut port = Row::new();
            port.insert("interface".to_string(), caps["interface"].into());
            port.insert("mode".to_string(), mode.clone().map_or(Value::Null, Value::from));
            port.insert(
                "state".to_string(),
                caps.name("state").map_or(Value::Null, |state| state.as_str().into()),
            );
            Value::Object(port)
        })
        .collect()
}

fn find_vlan(block: &Block, vid: i64) -> Option<usize> {
    block
        .doc()
        .rows("vlans")
        .iter()
        .position(|vlan| vlan.get("vid").and_then(Value::as_i64) == Some(vid))
}

fn ports_row(cursor: &mut VlanCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let vid = fields.int("vid")?;
    cursor.mode = None;
    let ports = parse_ports(fields.get("ports").unwrap_or_default(), &mut cursor.mode);
    let index = match find_vlan(block, vid) {
        Some(index) => index,
        None => {
            let mut row = Row::new();
            row.insert("vid".to_string(), vid.into());
            row.insert("ports".to_string(), Value::Array(Vec::new()));
            block.push_row("vlans", row);
            block.row_count("vlans") - 1
        }
    };
    if let Some(row) = block.row_mut("vlans", index) {
        row.insert("type".to_string(), fields.value("type"));
        if let Some(existing) = row.get_mut("ports").and_then(Value::as_array_mut) {
            existing.extend(ports);
        }
    }
    cursor.last_vlan = Some(index);
    Ok(())
}

fn ports_continuation(cursor: &mut VlanCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let ports = parse_ports(fields.require("ports")?, &mut cursor.mode);
    let existing = block
        .record_mut("vlans", cursor.last_vlan)
        .and_then(|row| row.get_mut("ports"))
        .and_then(Value::as_array_mut);
    match existing {
        Some(existing) => existing.extend(ports),
        None => block.warn_orphan(fields.line(), "port list continuation without a VLAN row"),
    }
    Ok(())
}

fn property_row(cursor: &mut VlanCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let vid = fields.int("vid")?;
    let properties = fields.row_of(&["status", "property", "mac_learning", "statistics", "description"]);
    let index = find_vlan(block, vid);
    match block.record_mut("vlans", index) {
        Some(row) => row.extend(properties),
        None => {
            let mut row = Row::new();
            row.insert("vid".to_string(), vid.into());
            row.insert("ports".to_string(), Value::Array(Vec::new()));
            row.extend(properties);
            block.push_row("vlans", row);
        }
    }
    cursor.last_vlan = None;
    Ok(())
}

fn ports_header(cursor: &mut VlanCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.last_vlan = None;
    Ok(())
}

fn legend(_: &mut VlanCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn count_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "vlans")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("vlan_count_matches", count_matches)];

fn property_rule() -> Result<Rule<VlanCursor>, regex::Error> {
    Rule::new(
        "property_row",
        r"^\s*(?P<vid>\d+)\s+(?P<status>enable|disable)\s+(?P<property>\S+)\s+(?P<mac_learning>enable|disable)\s+(?P<statistics>enable|disable)(?:\s+(?P<description>.*?))?\s*$",
        property_row,
    )
}

fn ports_rule() -> Result<Rule<VlanCursor>, regex::Error> {
    Rule::new("ports_row", r"^\s*(?P<vid>\d+)\s+(?P<type>\S+)(?:\s+(?P<ports>.*?))?\s*$", ports_row)
}

impl Grammar for Vlan {
    const NAME: &'static str = "vlan";
    type Cursor = VlanCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*The total number of vlans is\s*:\s*(?P<total>\d+)\s*$")?,
            rules: RuleSet::new(vec![
                property_rule()?,
                ports_rule()?,
                Rule::new(
                    "ports_continuation",
                    r"^\s+(?P<ports>(?:(?:UT|TG|MP|ST):)?[A-Za-z][^\s(]*\([A-Z]\).*?)\s*$",
                    ports_continuation,
                )?,
                Rule::new("ports_header", r"^\s*VID\s+Type\s+Ports\s*$", ports_header)?,
                Rule::new("property_header", r"^\s*VID\s+Status\s+Property\b", legend)?,
                Rule::new("legend", r"^\s*\S+:\s.*;\s*$", legend)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<VlanCursor> {
        &self.rules
    }

    fn start(&self, _: &mut VlanCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("total", entry.get("total").unwrap_or_default());
        block.set("vlans", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
