//! `display power`.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Power {
    entry: Regex,
    rules: RuleSet<()>,
}

fn supply(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("supplies", fields.row());
    Ok(())
}

impl Grammar for Power {
    const NAME: &'static str = "power";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Slot\s+PowerID\s+Online\s+Mode\s+State\b")?,
            rules: RuleSet::new(vec![Rule::new(
                "supply",
                r"^\s*(?P<slot>\d+)\s+(?P<power_id>\S+)\s+(?P<online>\S+)\s+(?P<mode>\S+)\s+(?P<state>\S+)(?:\s+(?P<power_watts>\S+))?\s*$",
                supply,
            )?]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("supplies", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
