//! `display ip vpn-instance verbose`.
//!
//! Each `VPN-Instance Name and ID` line opens an instance; the properties
//! after an `Address family` line belong to that family. The interface list
//! wraps onto indented lines of bare interface names.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, Row, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value, object_entry, snake_key};
use crate::rule::{Fields, Rule, RuleSet};

pub struct VpnInstance {
    entry: Regex,
    rules: RuleSet<VpnCursor>,
}

#[derive(Debug, Default)]
pub struct VpnCursor {
    instance: Option<usize>,
    family: Option<String>,
}

fn interface_names(text: &str) -> impl Iterator<Item = Value> + '_ {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Value::from)
}

fn family_total(_: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let family = fields.require("family")?.to_ascii_lowercase();
    block.set(&format!("{family}_total"), fields.int("count")?);
    Ok(())
}

fn instance(cursor: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["name", "id"]);
    row.insert("interfaces".to_string(), Value::Array(Vec::new()));
    row.insert("address_families".to_string(), Value::Object(Row::new()));
    block.push_row("instances", row);
    cursor.instance = Some(block.row_count("instances") - 1);
    cursor.family = None;
    Ok(())
}

fn interfaces(cursor: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let names = interface_names(fields.get("interfaces").unwrap_or_default());
    let list = block
        .record_mut("instances", cursor.instance)
        .and_then(|row| row.get_mut("interfaces"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| RuleError::OutOfContext("interface list outside a VPN instance".to_string()))?;
    list.extend(names);
    Ok(())
}

fn interface_continuation(cursor: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let names: Vec<Value> = interface_names(fields.get("interfaces").unwrap_or_default()).collect();
    let list = block
        .record_mut("instances", cursor.instance)
        .and_then(|row| row.get_mut("interfaces"))
        .and_then(Value::as_array_mut);
    match list {
        Some(list) => list.extend(names),
        None => block.warn_orphan(fields.line(), "interface list continuation without a VPN instance"),
    }
    Ok(())
}

fn address_family(cursor: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let family = snake_key(fields.require("family")?);
    let row = block
        .record_mut("instances", cursor.instance)
        .ok_or_else(|| RuleError::OutOfContext("address family outside a VPN instance".to_string()))?;
    object_entry(object_entry(row, "address_families"), &family);
    cursor.family = Some(family);
    Ok(())
}

fn property(cursor: &mut VpnCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    let row = block
        .record_mut("instances", cursor.instance)
        .ok_or_else(|| RuleError::OutOfContext(format!("{key} outside a VPN instance")))?;
    let target = match &cursor.family {
        Some(family) => object_entry(object_entry(row, "address_families"), family),
        None => row,
    };
    target.insert(key, value);
    Ok(())
}

fn count_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "instances")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("instance_count_matches", count_matches)];

impl Grammar for VpnInstance {
    const NAME: &'static str = "vpn_instance";
    type Cursor = VpnCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Total VPN-Instances configured\s*:\s*(?P<total>\d+)\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "family_total",
                    r"^\s*Total (?P<family>IPv4|IPv6) VPN-Instances configured\s*:\s*(?P<count>\d+)\s*$",
                    family_total,
                )?,
                Rule::new(
                    "instance",
                    r"^\s*VPN-Instance Name and ID\s*:\s*(?P<name>[^,]+?)\s*,\s*(?P<id>\d+)\s*$",
                    instance,
                )?,
                Rule::new("interfaces", r"^\s*Interfaces?\s*:\s*(?P<interfaces>.*?)\s*$", interfaces)?,
                Rule::new(
                    "interface_continuation",
                    r"^\s+(?P<interfaces>[A-Za-z][\w\-./:]*\d(?:\s*,\s*[A-Za-z][\w\-./:]*\d)*\s*,?)\s*$",
                    interface_continuation,
                )?,
                Rule::new("address_family", r"^\s*Address family\s+(?P<family>\S+)\s*$", address_family)?,
                Rule::new("property", KEY_VALUE_PATTERN, property)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<VpnCursor> {
        &self.rules
    }

    fn start(&self, _: &mut VpnCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("total", entry.get("total").unwrap_or_default());
        block.set("instances", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
