//! `display device`.
//!
//! Sub-card rows leave the slot column blank and belong to the slot row
//! above them. A sub-card row with no slot row before it is kept as a
//! top-level slot with a `null` slot number.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Device {
    entry: Regex,
    rules: RuleSet<DeviceCursor>,
}

#[derive(Debug, Default)]
pub struct DeviceCursor {
    last_slot: Option<usize>,
}

const CARD_COLUMNS: &[&str] = &["sub", "type", "online", "power", "register", "alarm", "primary"];

fn slot(cursor: &mut DeviceCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["slot"]);
    row.extend(fields.row_of(CARD_COLUMNS));
    row.insert("sub_cards".to_string(), Value::Array(Vec::new()));
    block.push_row("slots", row);
    cursor.last_slot = Some(block.row_count("slots") - 1);
    Ok(())
}

fn sub_card(cursor: &mut DeviceCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let card = fields.row_of(CARD_COLUMNS);
    let sub_cards = block
        .record_mut("slots", cursor.last_slot)
        .and_then(|slot| slot.get_mut("sub_cards"))
        .and_then(Value::as_array_mut);
    match sub_cards {
        Some(sub_cards) => sub_cards.push(Value::Object(card)),
        None => {
            tracing::debug!(line = fields.line(), "sub-card without slot kept as slot");
            let mut row = card;
            row.insert("slot".to_string(), Value::Null);
            row.insert("sub_cards".to_string(), Value::Array(Vec::new()));
            block.push_row("slots", row);
        }
    }
    Ok(())
}

fn header(_: &mut DeviceCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

impl Grammar for Device {
    const NAME: &'static str = "device";
    type Cursor = DeviceCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*(?P<model>\S+)'s Device status:\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "slot",
                    r"^\s*(?P<slot>\d+)\s+(?P<sub>\S+)\s+(?P<type>\S+)\s+(?P<online>\S+)\s+(?P<power>\S+)\s+(?P<register>\S+)\s+(?P<alarm>\S+)\s+(?P<primary>\S+)\s*$",
                    slot,
                )?,
                Rule::new(
                    "sub_card",
                    r"^\s+(?P<sub>\S+)\s+(?P<type>\S+)\s+(?P<online>\S+)\s+(?P<power>\S+)\s+(?P<register>\S+)\s+(?P<alarm>\S+)\s+(?P<primary>\S+)\s*$",
                    sub_card,
                )?,
                Rule::new("header", r"^\s*Slot\s+Sub\s+Type\s+Online\b", header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<DeviceCursor> {
        &self.rules
    }

    fn start(&self, _: &mut DeviceCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("model", entry.get("model").unwrap_or_default());
        block.set("slots", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
