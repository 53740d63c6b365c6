//! `display patch-information`.

use regex::Regex;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value};
use crate::rule::{Fields, Rule, RuleSet};

pub struct PatchInfo {
    entry: Regex,
    rules: RuleSet<()>,
}

fn property(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    block.set(&key, value);
    Ok(())
}

impl Grammar for PatchInfo {
    const NAME: &'static str = "patch_info";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Patch Package Name\s*:")?,
            rules: RuleSet::new(vec![Rule::new("property", KEY_VALUE_PATTERN, property)?]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), _: &mut Block, _: &EntryMatch) -> Seed {
        Seed::ParseEntryLine
    }
}
