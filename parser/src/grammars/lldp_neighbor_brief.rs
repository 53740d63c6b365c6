//! `display lldp neighbor brief`.
//!
//! Neighbor device names may contain single spaces; columns are separated
//! by runs of two or more.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct LldpNeighborBrief {
    entry: Regex,
    rules: RuleSet<()>,
}

fn neighbor(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("neighbors", fields.row());
    Ok(())
}

impl Grammar for LldpNeighborBrief {
    const NAME: &'static str = "lldp_neighbor_brief";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Local Intf\s+Neighbor Dev\s+Neighbor Intf\s+Exptime")?,
            rules: RuleSet::new(vec![Rule::new(
                "neighbor",
                r"^\s*(?P<local_interface>\S+)\s{2,}(?P<neighbor_device>\S.*?)\s{2,}(?P<neighbor_interface>\S+)\s+(?P<expire_seconds>\d+)\s*$",
                neighbor,
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
        block.set("neighbors", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
