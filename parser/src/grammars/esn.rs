//! `display esn`.
//!
//! Every line has the same shape as the first, so a repeated entry line
//! continues the block instead of splitting it. Any other non-blank line
//! ends it.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

const ESN_PATTERN: &str = r"^\s*ESN of\s+(?P<scope>[^:]+?)\s*:\s*(?P<esn>\S+)\s*$";

pub struct Esn {
    entry: Regex,
    rules: RuleSet<()>,
}

fn serial(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["scope"]);
    // Serial numbers are identifiers even when all digits.
    row.insert("esn".to_string(), fields.require("esn")?.into());
    block.push_row("serials", row);
    Ok(())
}

impl Grammar for Esn {
    const NAME: &'static str = "esn";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(ESN_PATTERN)?,
            rules: RuleSet::new(vec![Rule::new("serial", ESN_PATTERN, serial)?]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("serials", Value::Array(Vec::new()));
        Seed::ParseEntryLine
    }

    fn ends_block(&self, _: &(), _: &Block, line: &str) -> Option<bool> {
        Some(!(line.trim().is_empty() || self.entry.is_match(line)))
    }
}
