//! `display memory-usage`.

use regex::Regex;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::iso_timestamp;
use crate::rule::{Fields, Rule, RuleSet};

pub struct MemoryUsage {
    entry: Regex,
    rules: RuleSet<()>,
}

fn total(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total_kb", fields.int("total_kb")?);
    Ok(())
}

fn used(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("used_kb", fields.int("used_kb")?);
    Ok(())
}

fn percent(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("used_percent", fields.int("used_percent")?);
    Ok(())
}

fn used_within_total(doc: &Document) -> Result<(), String> {
    match (doc.get_i64("used_kb"), doc.get_i64("total_kb")) {
        (Some(used), Some(total)) if used > total => {
            Err(format!("used memory {used} KB exceeds total {total} KB"))
        }
        _ => Ok(()),
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::error("used_within_total", used_within_total)];

impl Grammar for MemoryUsage {
    const NAME: &'static str = "memory_usage";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Memory utilization statistics at\s+(?P<timestamp>.+?)\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new("total", r"^\s*System Total Memory Is:\s*(?P<total_kb>\d+)\s*Kbytes\s*$", total)?,
                Rule::new("used", r"^\s*Total Memory Used Is:\s*(?P<used_kb>\d+)\s*Kbytes\s*$", used)?,
                Rule::new("percent", r"^\s*Memory Using Percentage Is:\s*(?P<used_percent>\d+)%\s*$", percent)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, entry: &EntryMatch) -> Seed {
        let raw = entry.get("timestamp").unwrap_or_default();
        block.set("timestamp", iso_timestamp(raw).unwrap_or_else(|| raw.to_string()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
