//! `display stp brief`.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct StpBrief {
    entry: Regex,
    rules: RuleSet<()>,
}

fn port(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("ports", fields.row());
    Ok(())
}

impl Grammar for StpBrief {
    const NAME: &'static str = "stp_brief";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*MSTID\s+Port\s+Role\s+STP State\s+Protection\s*$")?,
            rules: RuleSet::new(vec![Rule::new(
                "port",
                r"^\s*(?P<mstid>\d+)\s+(?P<port>\S+)\s+(?P<role>\S+)\s+(?P<state>\S+)\s+(?P<protection>\S+)\s*$",
                port,
            )?]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("ports", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
