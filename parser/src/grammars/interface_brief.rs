//! `display interface brief`.
//!
//! The flag legend that precedes the table is tolerated. Indented rows are
//! members of the Eth-Trunk listed above them and carry `trunk`.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct InterfaceBrief {
    entry: Regex,
    rules: RuleSet<BriefCursor>,
}

#[derive(Debug, Default)]
pub struct BriefCursor {
    trunk: Option<String>,
}

fn row(cursor: &mut BriefCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let interface = fields.require("interface")?;
    let indented = fields.line().starts_with(char::is_whitespace);
    let mut row = fields.row();
    if indented {
        row.insert("trunk".to_string(), cursor.trunk.clone().map_or(Value::Null, Value::from));
    } else {
        cursor.trunk = interface.starts_with("Eth-Trunk").then(|| interface.to_string());
    }
    block.push_row("interfaces", row);
    Ok(())
}

fn legend(_: &mut BriefCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

impl Grammar for InterfaceBrief {
    const NAME: &'static str = "interface_brief";
    type Cursor = BriefCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*PHY:\s*Physical\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "row",
                    r"^\s*(?P<interface>[A-Za-z][\w\-./:]*)\s+(?P<phy>[*^#]?[a-z]+(?:\([a-zA-Z]\))?)\s+(?P<protocol>[*^#]?[a-z]+(?:\([a-zA-Z]\))*)\s+(?P<in_uti>[\d.]+%|--)\s+(?P<out_uti>[\d.]+%|--)\s+(?P<in_errors>\d+)\s+(?P<out_errors>\d+)\s*$",
                    row,
                )?,
                Rule::new(
                    "legend",
                    r"^\s*(?:[*^#]?down|\([a-zA-Z]\)|InUti/OutUti|Interface\s+PHY\s+Protocol).*$",
                    legend,
                )?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<BriefCursor> {
        &self.rules
    }

    fn start(&self, _: &mut BriefCursor, block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("interfaces", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
