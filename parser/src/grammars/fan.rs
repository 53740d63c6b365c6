//! `display fan`.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Fan {
    entry: Regex,
    rules: RuleSet<()>,
}

fn fan(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("fans", fields.row());
    Ok(())
}

impl Grammar for Fan {
    const NAME: &'static str = "fan";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Slot\s+FanID\s+FanNum\s+Present\b")?,
            rules: RuleSet::new(vec![Rule::new(
                "fan",
                r"^\s*(?P<slot>\d+)\s+(?P<fan_id>\d+)\s+(?P<fan_num>\S+)\s+(?P<present>\S+)\s+(?P<registered>\S+)\s+(?:(?P<speed_percent>\d+)%|-)\s+(?P<mode>\S+)\s*$",
                fan,
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
        block.set("fans", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
