//! `display transceiver interface <if> verbose`.
//!
//! Properties are grouped under `X information:` section lines; each
//! section becomes a nested object keyed by its snake-cased name.

use regex::Regex;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value, object_entry, snake_key};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Transceiver {
    entry: Regex,
    rules: RuleSet<TransceiverCursor>,
}

#[derive(Debug, Default)]
pub struct TransceiverCursor {
    section: Option<String>,
}

fn section(cursor: &mut TransceiverCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let key = snake_key(fields.require("section")?);
    object_entry(block.fields_mut(), &key);
    cursor.section = Some(key);
    Ok(())
}

fn property(cursor: &mut TransceiverCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    let target = match &cursor.section {
        Some(section) => object_entry(block.fields_mut(), section),
        None => block.fields_mut(),
    };
    target.insert(key, value);
    Ok(())
}

impl Grammar for Transceiver {
    const NAME: &'static str = "transceiver";
    type Cursor = TransceiverCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*(?P<interface>\S+) transceiver information:\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new("section", r"^\s*(?P<section>[A-Z][\w ]*?) information:\s*$", section)?,
                Rule::new("property", KEY_VALUE_PATTERN, property)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<TransceiverCursor> {
        &self.rules
    }

    fn start(&self, _: &mut TransceiverCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("interface", entry.get("interface").unwrap_or_default());
        Seed::HeaderOnly
    }
}
