//! `display elabel`.
//!
//! Electronic labels nest chassis → slot → card → port. `[Slot_N]`,
//! `[Card_N]`/`[Main_Board]` and `[Port_N]` headers move the current scope;
//! any other bracketed header (`[Board Properties]`, `/$[ArchivesInfo
//! Version]`) opens a property group inside the current scope, and
//! `Key=Value` lines fill that group.
//!
//! The bracketed headers look like `[host]` prompts, so the block only ends
//! at an angle, hash, `[~host]` or `[*host]` prompt.

use regex::Regex;
use serde_json::Value;

use netlog_core::Row;

use crate::block::{Block, EntryMatch};
use crate::classify::{command_echo, is_prompt};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{object_entry, snake_key};
use crate::rule::{Fields, Rule, RuleSet, trimmed_value};

pub struct Elabel {
    first_group: Regex,
    rules: RuleSet<ElabelCursor>,
}

#[derive(Debug, Default)]
pub struct ElabelCursor {
    slot: Option<usize>,
    card: Option<usize>,
    port: Option<usize>,
    group: Option<String>,
}

fn nested_row<'a>(row: &'a mut Row, key: &str, index: usize) -> Option<&'a mut Row> {
    row.get_mut(key)?.as_array_mut()?.get_mut(index)?.as_object_mut()
}

fn push_child(parent: &mut Row, key: &str, child: Row) -> usize {
    let children = object_entry_array(parent, key);
    children.push(Value::Object(child));
    children.len() - 1
}

fn object_entry_array<'a>(row: &'a mut Row, key: &str) -> &'a mut Vec<Value> {
    let slot = row.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just made an array"),
    }
}

/// Row of the innermost open scope below the chassis.
fn scope_row<'a>(block: &'a mut Block, cursor: &ElabelCursor) -> Option<&'a mut Row> {
    let mut row = block.record_mut("slots", cursor.slot)?;
    if let Some(card) = cursor.card {
        row = nested_row(row, "cards", card)?;
    }
    if let Some(port) = cursor.port {
        row = nested_row(row, "ports", port)?;
    }
    Some(row)
}

fn scope(name: &str) -> Row {
    let mut row = Row::new();
    row.insert("name".to_string(), name.into());
    row.insert("properties".to_string(), Value::Object(Row::new()));
    row
}

fn slot(cursor: &mut ElabelCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = scope(fields.require("name")?);
    row.insert("slot".to_string(), fields.value("number"));
    row.insert("cards".to_string(), Value::Array(Vec::new()));
    block.push_row("slots", row);
    *cursor = ElabelCursor {
        slot: Some(block.row_count("slots") - 1),
        ..ElabelCursor::default()
    };
    Ok(())
}

fn card(cursor: &mut ElabelCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let name = fields.require("name")?;
    let Some(slot) = block.record_mut("slots", cursor.slot) else {
        return Err(RuleError::OutOfContext(format!("card {name} outside a slot")));
    };
    let mut row = scope(name);
    row.insert("ports".to_string(), Value::Array(Vec::new()));
    cursor.card = Some(push_child(slot, "cards", row));
    cursor.port = None;
    cursor.group = None;
    Ok(())
}

fn port(cursor: &mut ElabelCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let name = fields.require("name")?;
    cursor.port = None;
    let Some(parent) = scope_row(block, cursor) else {
        return Err(RuleError::OutOfContext(format!("port {name} outside a slot")));
    };
    cursor.port = Some(push_child(parent, "ports", scope(name)));
    cursor.group = None;
    Ok(())
}

fn group(cursor: &mut ElabelCursor, _: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    cursor.group = Some(snake_key(fields.require("group")?));
    Ok(())
}

fn property(cursor: &mut ElabelCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let key = fields.require("key")?.to_string();
    let value = trimmed_value(fields.get("value").unwrap_or_default());
    let properties = match cursor.slot {
        None => object_entry(block.fields_mut(), "properties"),
        Some(_) => match scope_row(block, cursor) {
            Some(row) => object_entry(row, "properties"),
            None => return Err(RuleError::OutOfContext("property outside any scope".to_string())),
        },
    };
    let target = match &cursor.group {
        Some(group) => object_entry(properties, group),
        None => properties,
    };
    target.insert(key, value);
    Ok(())
}

impl Grammar for Elabel {
    const NAME: &'static str = "elabel";
    type Cursor = ElabelCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            first_group: Regex::new(r"^\s*/\$\[System Integration Version\]\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new("slot", r"^\s*\[(?P<name>Slot_(?P<number>\d+))\]\s*$", slot)?,
                Rule::new("card", r"^\s*\[(?P<name>(?:Card|Sub_Board)_\d+|Main_Board)\]\s*$", card)?,
                Rule::new("port", r"^\s*\[(?P<name>Port_\d+)\]\s*$", port)?,
                Rule::new("group", r"^\s*(?:/\$)?\[(?P<group>[^\]~*][^\]]*)\]\s*$", group)?,
                Rule::new("property", r"^\s*(?:/\$)?(?P<key>[A-Za-z][\w\-. ]*?)\s*=(?P<value>.*)$", property)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        if let Some(hostname) = command_echo(line, "display elabel") {
            return Some(EntryMatch::bare().with("hostname", hostname));
        }
        self.first_group.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<ElabelCursor> {
        &self.rules
    }

    fn start(&self, _: &mut ElabelCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set("properties", Value::Object(Row::new()));
        block.set("slots", Value::Array(Vec::new()));
        match entry.get("hostname") {
            Some(hostname) => {
                block.set("hostname", hostname);
                Seed::HeaderOnly
            }
            None => Seed::ParseEntryLine,
        }
    }

    fn ends_block(&self, _: &ElabelCursor, _: &Block, line: &str) -> Option<bool> {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && !(trimmed.starts_with("[~") || trimmed.starts_with("[*")) {
            return Some(false);
        }
        Some(is_prompt(line))
    }
}
