//! `display version`.
//!
//! The header names the VRP release and product; the device uptime line is
//! broken down into weeks, days, hours and minutes. Per-board sections
//! follow, and key/value lines land on the most recent board (or on the
//! document before the first board).

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use netlog_core::Row;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value};
use crate::rule::{Fields, Rule, RuleSet};

static UPTIME_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<count>\d+)\s*(?P<unit>week|day|hour|minute|second)s?").expect("static regex must compile")
});

pub struct Version {
    entry: Regex,
    rules: RuleSet<VersionCursor>,
}

#[derive(Debug, Default)]
pub struct VersionCursor {
    board: Option<usize>,
}

/// Breaks an uptime phrase such as `10 weeks, 2 days, 3 hours, 35 minutes`
/// into its parts plus a total in minutes. The total is omitted when it
/// does not fit in an `i64`.
pub fn parse_uptime(text: &str) -> Row {
    let mut row = Row::new();
    let mut total = Some(0i64);
    for caps in UPTIME_PART.captures_iter(text) {
        let Ok(count) = caps["count"].parse::<i64>() else {
            continue;
        };
        let (key, minutes) = match &caps["unit"] {
            "week" => ("weeks", 7 * 24 * 60),
            "day" => ("days", 24 * 60),
            "hour" => ("hours", 60),
            "minute" => ("minutes", 1),
            _ => ("seconds", 0),
        };
        row.insert(key.to_string(), count.into());
        total = total.and_then(|sum| count.checked_mul(minutes)?.checked_add(sum));
    }
    if let (false, Some(total)) = (row.is_empty(), total) {
        row.insert("total_minutes".to_string(), total.into());
    }
    row
}

fn copyright(_: &mut VersionCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("copyright", fields.value("copyright"));
    Ok(())
}

fn board_uptime(cursor: &mut VersionCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["board", "role", "slot"]);
    let uptime = fields.require("uptime")?;
    row.insert("uptime".to_string(), uptime.into());
    row.insert("uptime_parts".to_string(), Value::Object(parse_uptime(uptime)));
    block.push_row("boards", row);
    cursor.board = Some(block.row_count("boards") - 1);
    Ok(())
}

fn board_section(cursor: &mut VersionCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["board"]);
    row.insert("slot".to_string(), fields.value("slot"));
    block.push_row("boards", row);
    cursor.board = Some(block.row_count("boards") - 1);
    Ok(())
}

fn device_uptime(_: &mut VersionCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let uptime = fields.require("uptime")?;
    block.set("model", fields.value("model"));
    block.set("uptime", uptime);
    block.set("uptime_parts", Value::Object(parse_uptime(uptime)));
    Ok(())
}

fn property(cursor: &mut VersionCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    match block.record_mut("boards", cursor.board) {
        Some(board) => {
            board.insert(key, value);
        }
        None => block.set(&key, value),
    }
    Ok(())
}

impl Grammar for Version {
    const NAME: &'static str = "version";
    type Cursor = VersionCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(
                r"^\s*VRP \(R\) software,\s*Version\s+(?P<vrp_version>\S+)\s*(?:\((?P<product>\S+)\s+(?P<release>[^)]+)\))?\s*$",
            )?,
            rules: RuleSet::new(vec![
                Rule::new("copyright", r"^\s*Copyright\s*\(C\)\s*(?P<copyright>.+?)\s*$", copyright)?,
                Rule::new(
                    "board_uptime",
                    r"^\s*(?P<board>[A-Za-z][\w\-]*)(?:\((?P<role>\w+)\))?\s+(?P<slot>\d+)\s*:\s*uptime is\s+(?P<uptime>.+?)\s*$",
                    board_uptime,
                )?,
                Rule::new(
                    "board_section",
                    r"^\s*(?P<board>[A-Za-z][\w\-]*)\s+(?:(?P<slot>\d+)\s+)?version information\s*:?\s*$",
                    board_section,
                )?,
                Rule::new("device_uptime", r"^\s*(?P<model>.+?)\s+uptime is\s+(?P<uptime>.+?)\s*$", device_uptime)?,
                Rule::new("property", KEY_VALUE_PATTERN, property)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<VersionCursor> {
        &self.rules
    }

    fn start(&self, _: &mut VersionCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        for key in ["vrp_version", "product", "release"] {
            block.set_text(key, entry.get(key).unwrap_or_default());
        }
        block.set("boards", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
