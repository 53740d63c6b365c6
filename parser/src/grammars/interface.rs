//! `display interface [<name>]`.
//!
//! One block per interface. The detailed dump mixes sentences
//! (`Internet Address is ...`, `Last 300 seconds input rate ...`), single
//! `Key : value` lines and comma-separated pairs
//! (`Speed : 1000,  Loopback: NONE`). A second interface header ends the
//! current block and opens the next.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, comma_pairs, extend_row, key_value};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Interface {
    entry: Regex,
    rules: RuleSet<()>,
}

fn line_protocol(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("line_protocol", fields.value("state"));
    Ok(())
}

fn address(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["address"]);
    row.insert("secondary".to_string(), fields.get("secondary").is_some().into());
    block.push_row("ip_addresses", row);
    Ok(())
}

fn mtu(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    if let Some(port_type) = fields.get("port_type") {
        block.set("port_type", port_type);
    }
    block.set("mtu", fields.int("mtu")?);
    Ok(())
}

fn hardware_address(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    if let Some(format) = fields.get("frame_format") {
        block.set("frame_format", format);
    }
    block.set("mac_address", fields.value("mac"));
    Ok(())
}

fn rate(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let direction = fields.require("direction")?;
    block.set("rate_interval_seconds", fields.int("interval")?);
    block.set(&format!("{direction}_rate_bps"), fields.int("bits")?);
    block.set(&format!("{direction}_rate_pps"), fields.int("packets")?);
    Ok(())
}

fn counters(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let direction = fields.require("direction")?.to_ascii_lowercase();
    block.set(&format!("{direction}_packets"), fields.int("packets")?);
    block.set(&format!("{direction}_bytes"), fields.int("bytes")?);
    Ok(())
}

fn utilization(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let direction = fields.require("direction")?.to_ascii_lowercase();
    block.set(&format!("{direction}_utilization"), fields.value("value"));
    Ok(())
}

fn pairs(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    extend_row(block.fields_mut(), comma_pairs(fields.line()));
    Ok(())
}

fn property(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    block.set(&key, value);
    Ok(())
}

impl Grammar for Interface {
    const NAME: &'static str = "interface";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(
                r"^\s*(?P<interface>[A-Za-z][\w\-./:]*)\s+current state\s*:\s*(?P<state>.+?)(?:\s*\(ifindex:\s*(?P<ifindex>\d+)\))?\s*$",
            )?,
            rules: RuleSet::new(vec![
                Rule::new("line_protocol", r"^\s*Line protocol current state\s*:\s*(?P<state>.+?)\s*$", line_protocol)?,
                Rule::new(
                    "address",
                    r"^\s*Internet Address is\s+(?P<address>\S+)(?:\s+(?P<secondary>Sub))?\s*$",
                    address,
                )?,
                Rule::new(
                    "mtu",
                    r"^\s*(?:(?P<port_type>[^,]+?)\s*,\s*)?The Maximum Transmit Unit is\s+(?P<mtu>\d+)",
                    mtu,
                )?,
                Rule::new(
                    "hardware_address",
                    r"^\s*(?:IP Sending Frames' Format is\s+(?P<frame_format>[^,]+?)\s*,\s*)?Hardware address is\s+(?P<mac>[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4})",
                    hardware_address,
                )?,
                Rule::new(
                    "rate",
                    r"^\s*Last\s+(?P<interval>\d+)\s+seconds\s+(?P<direction>input|output)\s+rate:?\s*(?P<bits>\d+)\s+bits/sec,\s*(?P<packets>\d+)\s+packets/sec",
                    rate,
                )?,
                Rule::new(
                    "counters",
                    r"^\s*(?P<direction>Input|Output)\s*:\s*(?P<packets>\d+)\s+packets,\s*(?P<bytes>\d+)\s+bytes",
                    counters,
                )?,
                Rule::new(
                    "utilization",
                    r"^\s*(?P<direction>Input|Output) bandwidth utilization\s*:\s*(?P<value>\S+)\s*$",
                    utilization,
                )?,
                Rule::new("pairs", r"^\s*[A-Za-z][\w\- ]*?\s*:\s*[^,:]*,\s*[A-Za-z][\w\- ]*?\s*:", pairs)?,
                Rule::new("property", KEY_VALUE_PATTERN, property)?,
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
        for key in ["interface", "state", "ifindex"] {
            block.set_text(key, entry.get(key).unwrap_or_default());
        }
        block.set("ip_addresses", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
